//! Cache Module
//!
//! The instrumented key-value cache facade, its call instrumentation and the
//! scalar payload encoding.

mod instrument;
mod instrumented;
mod value;


// Re-export public types
pub use instrument::{
    inputs_key, outputs_key, CallOutcome, Instrumentation, InstrumentationOptions,
    InvocationRecord,
};
pub use instrumented::{InstrumentedCache, STORE_OP};
pub use value::{decode_float, decode_int, decode_utf8, StoredValue};
