//! Per-request envelopes passed through a wrapper chain.
//!
//! Each is created by one entry point call, narrowed by wrappers on the way
//! in, and carries the terminal's `response` on the way out.

use grove_storage::{Record, RequestContext};

#[derive(Debug, Clone, Default)]
pub struct CreateContext {
    pub data: Record,
    pub response: Option<Record>,
    pub request: RequestContext,
}

impl CreateContext {
    pub fn new(data: Record, request: RequestContext) -> Self {
        Self {
            data,
            response: None,
            request,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateContext {
    /// Unique-where input addressing the record.
    pub unique_where: Record,
    pub data: Record,
    pub response: Option<Record>,
    pub request: RequestContext,
}

impl UpdateContext {
    pub fn new(unique_where: Record, data: Record, request: RequestContext) -> Self {
        Self {
            unique_where,
            data,
            response: None,
            request,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteContext {
    pub unique_where: Record,
    /// The deleted record.
    pub response: Option<Record>,
    pub request: RequestContext,
}

impl DeleteContext {
    pub fn new(unique_where: Record, request: RequestContext) -> Self {
        Self {
            unique_where,
            response: None,
            request,
        }
    }
}
