//! Clinical document logic for record exchange.
//!
//! This crate holds the pure document side of the exchange service: turning a
//! stored clinical record graph into a self-contained transaction bundle
//! (assembly, normalization, reference rewriting), validating inbound
//! submissions, and extracting record content back out of a received
//! document. It performs no I/O and knows nothing about persistence.

pub mod assemble;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod rewrite;
pub mod validate;

pub use assemble::{assemble, AssembleError};
pub use extract::{contact_email, ExtractError};
pub use model::{resource_type_of, Bundle, BundleEntry, BundleRequest, RecordContent};
pub use normalize::prepare_resource;
pub use rewrite::rewrite_references;
pub use validate::{
    issues_to_operation_outcome, validate_submission, IssueCode, IssueSeverity, ValidationIssue,
};
