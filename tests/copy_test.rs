// Copyright 2025 TempoDB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! COPY tests

use std::io::Write as _;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tempodb::core::Result;
use tempodb::executor::{CompiledQuery, ExecutionContext, SqlCompiler};
use tempodb::text::{Atomicity, LoadState, TextLoader};
use tempodb::{Error, MemEngine};

/// Loader double sharing its observations with the test
#[derive(Default)]
struct Probe {
    table: std::sync::Mutex<String>,
    analyzed: AtomicUsize,
    loaded: AtomicUsize,
    wrapped_up: AtomicBool,
}

struct RecordingLoader {
    probe: Arc<Probe>,
    state: LoadState,
}

impl TextLoader for RecordingLoader {
    fn clear(&mut self) {
        self.state = LoadState::AnalyzeStructure;
    }

    fn configure_destination(&mut self, table: &str, _overwrite: bool, atomicity: Atomicity) {
        assert_eq!(atomicity, Atomicity::SkipRow);
        *self.probe.table.lock().unwrap() = table.to_string();
    }

    fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    fn parse(&mut self, data: &[u8]) -> Result<()> {
        match self.state {
            LoadState::AnalyzeStructure => {
                self.probe.analyzed.fetch_add(data.len(), Ordering::Relaxed)
            }
            LoadState::LoadData => self.probe.loaded.fetch_add(data.len(), Ordering::Relaxed),
        };
        Ok(())
    }

    fn wrap_up(&mut self) -> Result<()> {
        self.probe.wrapped_up.store(true, Ordering::Relaxed);
        Ok(())
    }
}

fn setup() -> (SqlCompiler, ExecutionContext, Arc<Probe>) {
    let engine = Arc::new(MemEngine::new());
    let mut compiler = SqlCompiler::new(engine);
    let probe = Arc::new(Probe::default());
    compiler.set_text_loader(RecordingLoader {
        probe: probe.clone(),
        state: LoadState::AnalyzeStructure,
    });
    (compiler, ExecutionContext::new(), probe)
}

#[test]
fn test_copy_local_file() {
    let (mut compiler, ctx, probe) = setup();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let payload = b"ts,price\n2020-01-01T00:00:00Z,1.5\n2020-01-01T00:00:01Z,2.5\n";
    file.write_all(payload).unwrap();
    file.flush().unwrap();

    let sql = format!("COPY '{}' INTO trades", file.path().display());
    let result = compiler.compile(&sql, &ctx).unwrap();
    assert!(matches!(result, CompiledQuery::CopyLocal));

    assert_eq!(&*probe.table.lock().unwrap(), "trades");
    // the first chunk is analysed, the rest loads; one small file means
    // everything lands in the analyse counter
    assert_eq!(
        probe.analyzed.load(Ordering::Relaxed) + probe.loaded.load(Ordering::Relaxed),
        payload.len()
    );
    assert!(probe.wrapped_up.load(Ordering::Relaxed));
}

#[test]
fn test_copy_large_file_switches_state() {
    let (mut compiler, ctx, probe) = setup();

    // bigger than one copy buffer, so the loader sees both states
    let chunk = compiler.config().copy_buffer_size;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let payload = vec![b'x'; chunk + 1024];
    file.write_all(&payload).unwrap();
    file.flush().unwrap();

    let sql = format!("COPY '{}' INTO bulk", file.path().display());
    compiler.compile(&sql, &ctx).unwrap();

    assert_eq!(probe.analyzed.load(Ordering::Relaxed), chunk);
    assert_eq!(probe.loaded.load(Ordering::Relaxed), 1024);
    assert!(probe.wrapped_up.load(Ordering::Relaxed));
}

#[test]
fn test_copy_stdin_returns_remote_loader() {
    let (mut compiler, ctx, probe) = setup();

    let result = compiler.compile("COPY 'stdin' INTO trades", &ctx).unwrap();
    let CompiledQuery::CopyRemote(loader) = result else {
        panic!("expected remote copy");
    };
    assert_eq!(&*probe.table.lock().unwrap(), "trades");
    // the HTTP handler feeds the loader from here on
    loader.lock().parse(b"a,b\n").unwrap();
    assert_eq!(probe.analyzed.load(Ordering::Relaxed), 4);
    assert!(!probe.wrapped_up.load(Ordering::Relaxed));
}

#[test]
fn test_copy_missing_file_reports_errno() {
    let (mut compiler, ctx, _) = setup();
    let err = compiler
        .compile("COPY '/definitely/not/here.csv' INTO trades", &ctx)
        .unwrap_err();
    match err {
        Error::Io { errno, ref message, .. } => {
            assert!(message.contains("could not open file"));
            assert_ne!(errno, 0);
        }
        other => panic!("expected io error, got {}", other),
    }
}

#[test]
fn test_copy_empty_file() {
    let (mut compiler, ctx, probe) = setup();
    let file = tempfile::NamedTempFile::new().unwrap();
    let sql = format!("COPY '{}' INTO empty_table", file.path().display());
    let result = compiler.compile(&sql, &ctx).unwrap();
    assert!(matches!(result, CompiledQuery::CopyLocal));
    // nothing was parsed, nothing to wrap up
    assert_eq!(probe.analyzed.load(Ordering::Relaxed), 0);
    assert!(!probe.wrapped_up.load(Ordering::Relaxed));
}
