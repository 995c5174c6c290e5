mod collaborators;
mod store;

pub use collaborators::{
    ErrorSink, ReviewScheduler, ScheduleUpdate, SchedulingInput, SchemaValidator,
    StorageHealthProbe, TagSimilarity,
};
pub use store::{DocumentStore, TransactionMode, WriteOp};
