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

//! Output destinations.
//!
//! Every output is a [`MakeWriter`]: the engine hands one to a
//! `tracing_subscriber::fmt` layer and keeps a clone to flush on sync.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::rolling::{InitError, RollingFileAppender, RollingWriter, Rotation};
use tracing_subscriber::fmt::MakeWriter;

/// Adapts a clonable writer into a [`MakeWriter`]; each record is written
/// through a fresh clone.
///
/// Suited to handles that share their destination, such as in-memory
/// buffers behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct AddSync<W>(pub W);

impl<'a, W> MakeWriter<'a> for AddSync<W>
where
    W: io::Write + Clone + 'a,
{
    type Writer = W;

    fn make_writer(&'a self) -> Self::Writer {
        self.0.clone()
    }
}

/// A log file opened through `tracing_appender`. Records are appended and the
/// file is never rotated.
#[derive(Clone)]
pub struct FileOutput {
    appender: Arc<RollingFileAppender>,
}

impl FileOutput {
    /// Open `path` for appending, creating the file and its missing parent
    /// directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InitError> {
        let path = path.as_ref();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(directory)?;

        Ok(FileOutput {
            appender: Arc::new(appender),
        })
    }
}

impl fmt::Debug for FileOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOutput").finish_non_exhaustive()
    }
}

impl<'a> MakeWriter<'a> for FileOutput {
    type Writer = RollingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        MakeWriter::make_writer(&*self.appender)
    }
}
