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

//! Global tracing installation
//!
//! Kept in its own test binary: the global subscriber can be set only once
//! per process, so everything runs inside a single test.

use ctxlog::{args, init_tracing, AddSync, Engine, Level, LogError, Logger};
use ctxlog_test_utils::SharedBuffer;

#[test]
fn test_init_tracing_routes_events_and_runs_once() {
    let buffer = SharedBuffer::new();
    let engine = Engine::builder()
        .with_level(Level::Info)
        .with_output("buffer", AddSync(buffer.clone()))
        .build();
    let logger = Logger::from_engine(engine).with(None, args!["service", "billing"]);

    init_tracing(&logger).unwrap();

    tracing::info!(order = 42_u64, "order accepted");
    tracing::debug!("below the configured level");

    let records = buffer.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["message"], "order accepted");
    assert_eq!(records[0]["order"], 42);
    assert_eq!(records[0]["service"], "billing");
    assert_eq!(records[0]["level"], "info");

    let err = init_tracing(&logger).unwrap_err();
    assert!(matches!(err, LogError::Init(_)));
}
