pub mod catalog;
pub mod discovery;
pub mod invoker;

pub use crate::domain::model::{
    CommandOutput, FilterPolicy, RawIngressRecord, ServiceCatalog, ServiceEntry,
};
pub use crate::domain::ports::{CommandRunner, ConfigProvider};
pub use crate::utils::error::Result;
