#![forbid(unsafe_code)]

pub mod repository;
pub mod rpc;

pub use repository::{
    AnswerRecord, AnswerSink, Backend, BackendError, InMemoryBackend, MockCatalog, RawOptionEntry,
    RawOptions, RawQuestion, RawSection, SectionPayload, SectionSource,
};
pub use rpc::{RpcBackend, RpcConfig};
