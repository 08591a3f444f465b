//! Sinks for converted routes

use crate::literal::format_route_line;
use crate::models::CoordRoute;
use anyhow::{Context, Result};
use std::io::{BufWriter, Write};

/// Receives each converted route in input order
pub trait RouteConsumer {
    fn accept(&mut self, route: &CoordRoute) -> Result<()>;

    /// Called once after the last route
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<C: RouteConsumer + ?Sized> RouteConsumer for &mut C {
    fn accept(&mut self, route: &CoordRoute) -> Result<()> {
        (**self).accept(route)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Streams routes as literal lines, one route per line
pub struct RouteWriter<W: Write> {
    out: BufWriter<W>,
    written: usize,
}

impl<W: Write> RouteWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Number of routes written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush route output: {}", e.error()))
    }
}

impl<W: Write> RouteConsumer for RouteWriter<W> {
    fn accept(&mut self, route: &CoordRoute) -> Result<()> {
        writeln!(self.out, "{}", format_route_line(route)).context("Failed to write route")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush route output")
    }
}

/// Keeps converted routes in memory
#[derive(Debug, Default)]
pub struct RouteCollector {
    routes: Vec<CoordRoute>,
}

impl RouteCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[CoordRoute] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<CoordRoute> {
        self.routes
    }
}

impl RouteConsumer for RouteCollector {
    fn accept(&mut self, route: &CoordRoute) -> Result<()> {
        self.routes.push(route.clone());
        Ok(())
    }
}

/// Hands every route to two consumers, first `A` then `B`
pub struct Tee<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: RouteConsumer, B: RouteConsumer> RouteConsumer for Tee<A, B> {
    fn accept(&mut self, route: &CoordRoute) -> Result<()> {
        self.first.accept(route)?;
        self.second.accept(route)
    }

    fn finish(&mut self) -> Result<()> {
        self.first.finish()?;
        self.second.finish()
    }
}
