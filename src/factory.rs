//! Driver registry.
//!
//! Maps driver names to driver instances. Use an owned [`DriverRegistry`]
//! when isolation matters (tests, multiple tenants) or
//! [`DriverRegistry::global`] for a single process-wide registry.

use crate::driver::{Connection, Driver};
use crate::{IamError, Result};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

static GLOBAL_REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();

/// Registry of named drivers.
///
/// # Example
///
/// ```
/// use rdsiam::drivers::mock::{MockSession, MockWireDriver};
/// use rdsiam::factory::DriverRegistry;
/// use rdsiam::Dialect;
/// use std::sync::Arc;
///
/// let registry = DriverRegistry::new();
/// let session = Arc::new(MockSession::new("us-east-1"));
/// let wire = Arc::new(MockWireDriver::new(Dialect::Mysql));
///
/// let name = rdsiam::register_iam_driver(&registry, session, Dialect::Mysql, wire)?;
/// assert_eq!(name, "aws_mysql_iam");
/// assert!(registry.contains(&name));
/// # Ok::<(), rdsiam::IamError>(())
/// ```
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static DriverRegistry {
        GLOBAL_REGISTRY.get_or_init(DriverRegistry::new)
    }

    /// Registers a driver under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::DriverAlreadyRegistered`] if the name is taken.
    pub fn register(&self, name: &str, driver: Arc<dyn Driver>) -> Result<()> {
        let mut reg = self.drivers.write().unwrap();
        if reg.contains_key(name) {
            return Err(IamError::DriverAlreadyRegistered(name.to_string()));
        }

        reg.insert(name.to_string(), driver);
        Ok(())
    }

    /// Looks up a driver by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.read().unwrap().get(name).cloned()
    }

    /// Checks whether a driver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.read().unwrap().contains_key(name)
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Opens a connection through the driver registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::UnknownDriver`] if nothing is registered under
    /// `name`, otherwise whatever the driver's `open` returns.
    pub async fn open(&self, name: &str, dsn: &str) -> Result<Box<dyn Connection>> {
        let driver = self
            .get(name)
            .ok_or_else(|| IamError::UnknownDriver(name.to_string()))?;

        driver.open(dsn).await
    }
}
