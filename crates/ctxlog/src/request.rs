// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Request and correlation IDs from inbound HTTP requests.

use crate::context::{Context, ContextKey};
use http::{HeaderMap, Request};
use uuid::Uuid;

/// Header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header carrying the correlation ID
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Derive a context that knows the request ID and correlation ID of `req`.
///
/// The request ID comes from `X-Request-ID` when that header is present and
/// non-empty; otherwise a random UUID v4 is generated. The correlation ID is
/// stored only when `X-Correlation-ID` is present and non-empty, so a missing
/// header never turns into an empty field. `ctx` itself is left unchanged.
pub fn with_request<B>(ctx: &Context, req: &Request<B>) -> Context {
    let headers = req.headers();

    let request_id = header_value(headers, REQUEST_ID_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut ctx = ctx.with_value(ContextKey::RequestId, request_id);

    if let Some(id) = header_value(headers, CORRELATION_ID_HEADER) {
        ctx = ctx.with_value(ContextKey::CorrelationId, id.to_string());
    }
    ctx
}

/// Request ID stored by [`with_request`]
pub fn request_id(ctx: &Context) -> Option<&str> {
    ctx.string(ContextKey::RequestId)
}

/// Correlation ID stored by [`with_request`]
pub fn correlation_id(ctx: &Context) -> Option<&str> {
    ctx.string(ContextKey::CorrelationId)
}

// Values that are not visible ASCII count as absent.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
