pub mod report;
pub mod round_trip;

pub use report::{
    RecordOutcome, Retrieval, RetrievalReport, RetrievedReview, Submission, render_pending,
    render_summary,
};
pub use round_trip::ReviewOrchestrator;
