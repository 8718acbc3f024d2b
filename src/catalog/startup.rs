//! Brings every attached table online

use super::progress::ProgressCounters;
use super::registry::CatalogRegistry;
use crate::error::{Error, Result};
use crate::pool::WorkerPool;
use std::sync::Arc;
use tracing::info;

pub struct StartupCoordinator<'a> {
    database: &'a str,
    registry: &'a CatalogRegistry,
}

impl<'a> StartupCoordinator<'a> {
    pub fn new(database: &'a str, registry: &'a CatalogRegistry) -> Self {
        Self { database, registry }
    }

    /// Start every registered table on `pool`. All dispatched tasks finish
    /// before the first failure is returned.
    pub fn startup(&self, pool: &dyn WorkerPool) -> Result<()> {
        let tables = self.registry.tables();
        if tables.is_empty() {
            return Ok(());
        }

        info!(database = self.database, tables = tables.len(), "starting up tables");
        let progress = Arc::new(ProgressCounters::new("startup", tables.len()));

        for table in tables {
            let progress = progress.clone();
            let scheduled = pool.schedule(Box::new(move || {
                table.handle.startup().map_err(|source| Error::StartupTable {
                    name: table.name,
                    query: table.query.to_string(),
                    source: Box::new(source),
                })?;
                progress.report();
                Ok(())
            }));

            if let Err(error) = scheduled {
                pool.wait()?;
                return Err(error);
            }
        }

        pool.wait()
    }
}
