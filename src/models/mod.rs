pub mod history;
pub mod request;
pub mod result;

pub use history::{
    HistoryEntry, HistoryFilter, HistoryKind, HistoryPayload, HistoryStats, SortOrder,
};
pub use request::{AnalysisMode, InputType, UploadFile};
pub use result::{
    Analysis, AnalysisResult, Answer, AnswerResult, EndpointFailure, EndpointResult, Extraction,
    ExtractionResult, FailureKind,
};
