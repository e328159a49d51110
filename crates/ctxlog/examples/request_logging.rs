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

//! Logs a few simulated requests with their request and correlation IDs.
//!
//! Run with `cargo run -p ctxlog --example request_logging`.

use ctxlog::{args, init_tracing, log_info, with_request, Config, Context, Logger};
use http::Request;

fn handle(root: &Logger, request: &Request<()>) {
    let ctx = with_request(&Context::new(), request);
    let logger = root.with(
        Some(&ctx),
        args!["method", request.method().as_str(), "path", request.uri().path()],
    );

    log_info!(logger, "handling {} {}", request.method(), request.uri());
    tracing::info!("tracing events carry the root logger's fields only");
    logger.debug("done");
}

fn main() -> anyhow::Result<()> {
    let root = Logger::new(
        &Config::new()
            .with_level("debug")
            .with_output_paths(["stdout"])
            .with_initial_field("service", "demo"),
    )?;
    init_tracing(&root)?;

    let requests = [
        Request::get("/orders").body(())?,
        Request::post("/orders")
            .header("X-Request-ID", "abc-123")
            .header("X-Correlation-ID", "checkout-7")
            .body(())?,
    ];
    for request in &requests {
        handle(&root, request);
    }

    root.sync()?;
    Ok(())
}
