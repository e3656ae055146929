//! In-process transport.
//!
//! `MemoryTransport` answers statements from a script instead of a server.
//! It hands out handles like the client library does and keeps an account
//! of every handle: which are still live, which were released twice, which
//! row buffers were released while their cursor still owned them, and which
//! session calls arrived after the library was torn down.
//!
//! ```
//! use nowdb_client::protocol::memory::{MemoryTransport, Reply};
//! use nowdb_client::protocol::RawField;
//!
//! let transport = MemoryTransport::new()
//!     .with_database("sales")
//!     .on_statement("select count(*) from orders", Reply::rows(vec![vec![RawField::uint(3)]]));
//! assert!(transport.report().is_clean());
//! ```

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::connect::ConnectParams;
use super::constants::*;
use super::transport::*;

/// Initialisation refused.
pub const ERR_INIT_FAILED: i32 = 1;
/// Handle unknown or already released.
pub const ERR_INVALID_HANDLE: i32 = 3;
/// Result cannot be opened as a cursor.
pub const ERR_NOT_A_CURSOR: i32 = 5;
/// `use` of a database that does not exist.
pub const ERR_UNKNOWN_DATABASE: i32 = 54;
/// No reply scripted for the statement.
pub const ERR_UNKNOWN_STATEMENT: i32 = 58;

type Fields = Vec<RawField>;
type Batch = Vec<Fields>;

/// Scripted reply to a statement.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Status result, ok.
    Status,
    /// Report result, ok.
    Report,
    /// Status result carrying a server error.
    Fail { code: i32, detail: Option<String> },
    /// Single-row result.
    Row(Fields),
    /// Cursor result delivering `batches` one fetch at a time, then either
    /// end-of-stream or `failure`.
    Cursor {
        batches: Vec<Batch>,
        failure: Option<(i32, String)>,
    },
    /// Ok result carrying an arbitrary type tag.
    Raw { tag: i32 },
}

impl Reply {
    /// Cursor result with all rows in one batch; no rows means an empty cursor.
    pub fn rows(rows: Vec<Fields>) -> Self {
        let batches = if rows.is_empty() { Vec::new() } else { vec![rows] };
        Reply::Cursor {
            batches,
            failure: None,
        }
    }

    /// Cursor result delivered in several batches.
    pub fn batches(batches: Vec<Batch>) -> Self {
        Reply::Cursor {
            batches,
            failure: None,
        }
    }

    /// Cursor result that fails with `code` after the given batches.
    pub fn failing_cursor(batches: Vec<Batch>, code: i32, detail: impl Into<String>) -> Self {
        Reply::Cursor {
            batches,
            failure: Some((code, detail.into())),
        }
    }

    /// Status result with a server error.
    pub fn fail(code: i32, detail: impl Into<String>) -> Self {
        Reply::Fail {
            code,
            detail: Some(detail.into()),
        }
    }
}

/// Handle accounting at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceReport {
    /// Handles issued and not yet released.
    pub live: Vec<u64>,
    /// Handles released more than once.
    pub double_releases: Vec<u64>,
    /// Cursor-owned row buffers released on their own.
    pub orphaned_row_releases: Vec<u64>,
    /// Session calls made after `teardown`.
    pub calls_after_teardown: usize,
}

impl ResourceReport {
    /// No leak, no double release, no orphaned row buffer, no use after teardown.
    pub fn is_clean(&self) -> bool {
        self.live.is_empty()
            && self.double_releases.is_empty()
            && self.orphaned_row_releases.is_empty()
            && self.calls_after_teardown == 0
    }
}

#[derive(Debug, Default)]
struct RowData {
    rows: Batch,
    pos: usize,
}

impl RowData {
    fn current(&self) -> Option<&Fields> {
        self.rows.get(self.pos)
    }
}

#[derive(Debug)]
enum Object {
    Session,
    Result {
        tag: i32,
        status: i32,
        details: Option<String>,
        data: RowData,
        batches: VecDeque<Batch>,
        failure: Option<(i32, String)>,
    },
    Cursor {
        batches: VecDeque<Batch>,
        failure: Option<(i32, String)>,
        error_code: i32,
        details: Option<String>,
        row: Option<u64>,
    },
    RowBuffer {
        data: RowData,
        owner: Option<u64>,
    },
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    objects: HashMap<u64, Object>,
    released: HashSet<u64>,
    double_releases: Vec<u64>,
    orphaned: Vec<u64>,

    databases: HashSet<String>,
    statements: HashMap<String, Reply>,
    init_failure: bool,
    connect_failure: Option<i32>,
    execute_failure: Option<i32>,
    close_connection_failure: Option<i32>,
    close_cursor_failure: Option<i32>,
    open_cursor_failure: Option<i32>,
    torn_down: bool,
    calls_after_teardown: usize,

    init_calls: usize,
    teardown_calls: usize,
    fetch_calls: usize,
    executed: Vec<String>,
    last_connect: Option<ConnectParams>,
}

impl State {
    fn alloc(&mut self, obj: Object) -> u64 {
        self.next_id += 1;
        self.objects.insert(self.next_id, obj);
        self.next_id
    }

    fn release(&mut self, id: u64) {
        let Some(obj) = self.objects.remove(&id) else {
            if self.released.contains(&id) {
                self.double_releases.push(id);
            }
            return;
        };
        self.released.insert(id);
        match obj {
            Object::Cursor { row: Some(row), .. } => self.release(row),
            Object::RowBuffer { owner: Some(owner), .. } if self.objects.contains_key(&owner) => {
                self.orphaned.push(id);
            }
            _ => {}
        }
    }

    fn note_session_call(&mut self) {
        if self.torn_down {
            self.calls_after_teardown += 1;
        }
    }

    fn row_data(&self, id: u64) -> Option<&RowData> {
        match self.objects.get(&id)? {
            Object::Result { data, .. } | Object::RowBuffer { data, .. } => Some(data),
            _ => None,
        }
    }

    fn row_data_mut(&mut self, id: u64) -> Option<&mut RowData> {
        match self.objects.get_mut(&id)? {
            Object::Result { data, .. } | Object::RowBuffer { data, .. } => Some(data),
            _ => None,
        }
    }

    fn reply_for(&self, stmt: &str) -> Reply {
        if let Some(db) = stmt.strip_prefix("use ") {
            let db = db.trim();
            return if self.databases.contains(db) {
                Reply::Status
            } else {
                Reply::fail(ERR_UNKNOWN_DATABASE, format!("unknown database '{}'", db))
            };
        }
        self.statements
            .get(stmt)
            .cloned()
            .unwrap_or_else(|| Reply::fail(ERR_UNKNOWN_STATEMENT, "unknown statement"))
    }
}

/// Scripted in-process transport.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    /// Create a transport with no databases and no scripted statements.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `use <name>` succeed.
    pub fn with_database(self, name: impl Into<String>) -> Self {
        self.lock().databases.insert(name.into());
        self
    }

    /// Script the reply to a statement.
    pub fn on_statement(self, stmt: impl Into<String>, reply: Reply) -> Self {
        self.lock().statements.insert(stmt.into(), reply);
        self
    }

    /// Make library initialisation fail.
    pub fn failing_init(self) -> Self {
        self.lock().init_failure = true;
        self
    }

    /// Refuse every connect handshake with `code`.
    pub fn refusing_connect(self, code: i32) -> Self {
        self.lock().connect_failure = Some(code);
        self
    }

    /// Fail every statement submission with `code`.
    pub fn failing_execute(self, code: i32) -> Self {
        self.lock().execute_failure = Some(code);
        self
    }

    /// Refuse to close sessions, answering `code`.
    pub fn failing_close_connection(self, code: i32) -> Self {
        self.lock().close_connection_failure = Some(code);
        self
    }

    /// Refuse to close cursors, answering `code`.
    pub fn failing_close_cursor(self, code: i32) -> Self {
        self.lock().close_cursor_failure = Some(code);
        self
    }

    /// Refuse to open cursors on cursor results, answering `code`.
    pub fn failing_open_cursor(self, code: i32) -> Self {
        self.lock().open_cursor_failure = Some(code);
        self
    }

    /// Allocate a standalone single-row buffer.
    pub fn alloc_row_buffer(&self, fields: Vec<RawField>) -> RowHandle {
        let id = self.lock().alloc(Object::RowBuffer {
            data: RowData {
                rows: vec![fields],
                pos: 0,
            },
            owner: None,
        });
        RowHandle(id)
    }

    /// Current handle accounting.
    pub fn report(&self) -> ResourceReport {
        let state = self.lock();
        let live: BTreeSet<u64> = state.objects.keys().copied().collect();
        ResourceReport {
            live: live.into_iter().collect(),
            double_releases: state.double_releases.clone(),
            orphaned_row_releases: state.orphaned.clone(),
            calls_after_teardown: state.calls_after_teardown,
        }
    }

    /// Number of handles not yet released.
    pub fn live_handles(&self) -> usize {
        self.lock().objects.len()
    }

    /// Number of `init` calls.
    pub fn init_calls(&self) -> usize {
        self.lock().init_calls
    }

    /// Number of `teardown` calls.
    pub fn teardown_calls(&self) -> usize {
        self.lock().teardown_calls
    }

    /// Number of `cursor_fetch` calls.
    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    /// Statements received, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    /// Parameters of the last connect call.
    pub fn last_connect(&self) -> Option<ConnectParams> {
        self.lock().last_connect.clone()
    }
}

impl Transport for MemoryTransport {
    fn init(&self) -> Status {
        let mut state = self.lock();
        state.init_calls += 1;
        if state.init_failure {
            Status(ERR_INIT_FAILED)
        } else {
            Status::OK
        }
    }

    fn teardown(&self) {
        let mut state = self.lock();
        state.teardown_calls += 1;
        state.torn_down = true;
    }

    fn connect(&self, params: &ConnectParams) -> Result<SessionHandle, Status> {
        let mut state = self.lock();
        state.note_session_call();
        state.last_connect = Some(params.clone());
        if let Some(code) = state.connect_failure {
            return Err(Status(code));
        }
        Ok(SessionHandle(state.alloc(Object::Session)))
    }

    fn close_connection(&self, session: SessionHandle) -> Status {
        let mut state = self.lock();
        state.note_session_call();
        if !matches!(state.objects.get(&session.0), Some(Object::Session)) {
            state.release(session.0);
            return Status(ERR_INVALID_HANDLE);
        }
        if let Some(code) = state.close_connection_failure {
            return Status(code);
        }
        state.release(session.0);
        Status::OK
    }

    fn destroy_connection(&self, session: SessionHandle) {
        let mut state = self.lock();
        state.note_session_call();
        state.release(session.0);
    }

    fn execute_statement(
        &self,
        session: SessionHandle,
        stmt: &str,
    ) -> Result<ResultHandle, Status> {
        let mut state = self.lock();
        state.note_session_call();
        if !matches!(state.objects.get(&session.0), Some(Object::Session)) {
            return Err(Status(ERR_INVALID_HANDLE));
        }
        if let Some(code) = state.execute_failure {
            return Err(Status(code));
        }
        let stmt = stmt.trim();
        state.executed.push(stmt.to_string());

        let obj = match state.reply_for(stmt) {
            Reply::Status => status_result(NOWDB_RESULT_STATUS, NOWDB_OK, None),
            Reply::Report => status_result(NOWDB_RESULT_REPORT, NOWDB_OK, None),
            Reply::Fail { code, detail } => status_result(NOWDB_RESULT_STATUS, code, detail),
            Reply::Row(fields) => Object::Result {
                tag: NOWDB_RESULT_ROW,
                status: NOWDB_OK,
                details: None,
                data: RowData {
                    rows: vec![fields],
                    pos: 0,
                },
                batches: VecDeque::new(),
                failure: None,
            },
            Reply::Cursor { batches, failure } => Object::Result {
                tag: NOWDB_RESULT_CURSOR,
                status: NOWDB_OK,
                details: None,
                data: RowData::default(),
                batches: batches.into(),
                failure,
            },
            Reply::Raw { tag } => status_result(tag, NOWDB_OK, None),
        };
        Ok(ResultHandle(state.alloc(obj)))
    }

    fn result_type(&self, result: ResultHandle) -> i32 {
        match self.lock().objects.get(&result.0) {
            Some(Object::Result { tag, .. }) => *tag,
            Some(Object::Cursor { .. }) => NOWDB_RESULT_CURSOR,
            Some(Object::RowBuffer { .. }) => NOWDB_RESULT_ROW,
            _ => -1,
        }
    }

    fn result_status(&self, result: ResultHandle) -> Status {
        match self.lock().objects.get(&result.0) {
            Some(Object::Result { status, .. }) => Status(*status),
            Some(Object::Cursor { error_code, .. }) => Status(*error_code),
            Some(Object::RowBuffer { .. }) => Status::OK,
            _ => Status(ERR_INVALID_HANDLE),
        }
    }

    fn result_error_code(&self, result: ResultHandle) -> Status {
        self.result_status(result)
    }

    fn result_details(&self, result: ResultHandle) -> Option<String> {
        match self.lock().objects.get(&result.0) {
            Some(Object::Result { details, .. }) | Some(Object::Cursor { details, .. }) => {
                details.clone()
            }
            _ => None,
        }
    }

    fn destroy_result(&self, result: ResultHandle) {
        self.lock().release(result.0);
    }

    fn open_cursor(&self, result: ResultHandle) -> Result<CursorHandle, Status> {
        let mut state = self.lock();
        let id = result.0;
        if let Some(code) = state.open_cursor_failure {
            return Err(Status(code));
        }
        let (batches, failure) = match state.objects.get_mut(&id) {
            Some(Object::Result {
                tag: NOWDB_RESULT_CURSOR,
                batches,
                failure,
                ..
            }) => (std::mem::take(batches), failure.take()),
            Some(_) => return Err(Status(ERR_NOT_A_CURSOR)),
            None => return Err(Status(ERR_INVALID_HANDLE)),
        };

        // the cursor takes over the result's handle
        let mut batches: VecDeque<Batch> = batches;
        let row = batches.pop_front().map(|rows| {
            state.alloc(Object::RowBuffer {
                data: RowData { rows, pos: 0 },
                owner: Some(id),
            })
        });
        state.objects.insert(
            id,
            Object::Cursor {
                batches,
                failure,
                error_code: NOWDB_OK,
                details: None,
                row,
            },
        );
        Ok(CursorHandle(id))
    }

    fn close_cursor(&self, cursor: CursorHandle) -> Status {
        let mut state = self.lock();
        if !matches!(state.objects.get(&cursor.0), Some(Object::Cursor { .. })) {
            state.release(cursor.0);
            return Status(ERR_INVALID_HANDLE);
        }
        if let Some(code) = state.close_cursor_failure {
            return Status(code);
        }
        state.release(cursor.0);
        Status::OK
    }

    fn cursor_row(&self, cursor: CursorHandle) -> Option<RowHandle> {
        match self.lock().objects.get(&cursor.0) {
            Some(Object::Cursor { row, .. }) => row.map(RowHandle),
            _ => None,
        }
    }

    fn cursor_fetch(&self, cursor: CursorHandle) -> Status {
        let mut state = self.lock();
        state.fetch_calls += 1;
        let id = cursor.0;

        let (next, row) = match state.objects.get_mut(&id) {
            Some(Object::Cursor {
                batches,
                failure,
                error_code,
                details,
                row,
            }) => match batches.pop_front() {
                Some(rows) => {
                    *error_code = NOWDB_OK;
                    *details = None;
                    (rows, *row)
                }
                None => {
                    let (code, detail) = match failure.take() {
                        Some((code, detail)) => (code, Some(detail)),
                        None => (NOWDB_EOF, None),
                    };
                    *error_code = code;
                    *details = detail;
                    return Status(code);
                }
            },
            _ => return Status(ERR_INVALID_HANDLE),
        };

        match row.filter(|r| state.objects.contains_key(r)) {
            Some(r) => {
                if let Some(data) = state.row_data_mut(r) {
                    data.rows = next;
                    data.pos = 0;
                }
            }
            None => {
                let child = state.alloc(Object::RowBuffer {
                    data: RowData { rows: next, pos: 0 },
                    owner: Some(id),
                });
                if let Some(Object::Cursor { row, .. }) = state.objects.get_mut(&id) {
                    *row = Some(child);
                }
            }
        }
        Status::OK
    }

    fn row_next(&self, row: RowHandle) -> Status {
        let mut state = self.lock();
        match state.row_data_mut(row.0) {
            Some(data) if data.pos + 1 < data.rows.len() => {
                data.pos += 1;
                Status::OK
            }
            Some(_) => Status::EOF,
            None => Status(ERR_INVALID_HANDLE),
        }
    }

    fn row_count(&self, row: RowHandle) -> usize {
        let state = self.lock();
        state
            .row_data(row.0)
            .and_then(RowData::current)
            .map_or(0, |fields| fields.len())
    }

    fn row_field(&self, row: RowHandle, idx: usize) -> RawField {
        let state = self.lock();
        state
            .row_data(row.0)
            .and_then(RowData::current)
            .and_then(|fields| fields.get(idx))
            .cloned()
            .unwrap_or_else(RawField::null)
    }
}

fn status_result(tag: i32, status: i32, details: Option<String>) -> Object {
    Object::Result {
        tag,
        status,
        details,
        data: RowData::default(),
        batches: VecDeque::new(),
        failure: None,
    }
}
