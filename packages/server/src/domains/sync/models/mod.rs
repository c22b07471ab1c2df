pub mod proposal_comment;
pub mod sync_batch;
pub mod sync_proposal;
pub mod sync_proposal_merge_source;

pub use proposal_comment::ProposalComment;
pub use sync_batch::SyncBatch;
pub use sync_proposal::{CreateSyncProposal, SyncProposal};
pub use sync_proposal_merge_source::SyncProposalMergeSource;
