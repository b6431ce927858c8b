//! Unit tests for ProcService
//!
//! Requests go straight to `on_message`; the runtime's framing and reply
//! clamping are covered in `procfs-dispatch`.
//!
//! # Test Categories
//!
//! - Connection state machine (open/close/share ordering)
//! - Access checks (read-only files, write-only connections)
//! - Cursor boundaries (read/write at and past the end)
//! - Truncate and share interplay
//! - Detach cleanup

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use procfs_dispatch::{
    Event, Message, Response, ServerApp, ServerContext, ServerRuntime, SessionId,
};
use procfs_ipc::{info, open, seek, status, IoHeader, IoOp};
use procfs_vfs::ipc::decode_entries;
use procfs_vfs::testing::{ImageBuilder, MemoryImage};
use procfs_vfs::{AccessFlags, DirEntry, FileType, OpenMode, VfsError};

use super::{ConnectionState, ProcService};
use crate::config::ServerConfig;
use crate::test_utils::{mock_message, path_payload, QueueChannel, RecordingShare};

const SESSION: u32 = 7;

fn echo_bytes() -> Vec<u8> {
    (0..128u8).collect()
}

fn booted() -> ProcService<RecordingShare> {
    let blob = ImageBuilder::new("0.1", "arm", "sun7i")
        .ram(0x4000_0000, 0x2000_0000)
        .device("uart0", 0x1c28000, 0x400)
        .file("echo", FileType::Exec, echo_bytes())
        .build();
    let mut svc = ProcService::new(ServerConfig::default(), RecordingShare::default());
    svc.bootstrap(&mut MemoryImage::new(blob)).unwrap();
    svc.init(&ServerContext::default()).unwrap();
    svc.on_attach(&ServerContext::default(), SessionId(SESSION))
        .unwrap();
    svc
}

fn send(svc: &mut ProcService<RecordingShare>, msg: Message) -> Response {
    svc.on_message(&ServerContext::default(), &msg)
}

fn open_path(svc: &mut ProcService<RecordingShare>, path: &str, flags: u32) -> Response {
    send(svc, mock_message(IoOp::Open, flags, SESSION, path_payload(path), 0))
}

fn read(svc: &mut ProcService<RecordingShare>, len: u32) -> Response {
    send(svc, mock_message(IoOp::Read, 0, SESSION, Vec::new(), len))
}

fn write(svc: &mut ProcService<RecordingShare>, bytes: &[u8]) -> Response {
    send(svc, mock_message(IoOp::Write, 0, SESSION, bytes.to_vec(), 0))
}

fn seek_to(svc: &mut ProcService<RecordingShare>, offset: i64, whence: u32) -> Response {
    send(
        svc,
        mock_message(IoOp::Seek, whence, SESSION, offset.to_le_bytes().to_vec(), 8),
    )
}

fn truncate(svc: &mut ProcService<RecordingShare>, size: u64) -> Response {
    send(
        svc,
        mock_message(IoOp::Truncate, 0, SESSION, size.to_le_bytes().to_vec(), 0),
    )
}

fn share(svc: &mut ProcService<RecordingShare>) -> Response {
    send(svc, mock_message(IoOp::Share, 0, SESSION, Vec::new(), 0))
}

fn close(svc: &mut ProcService<RecordingShare>) -> Response {
    send(svc, mock_message(IoOp::Close, 0, SESSION, Vec::new(), 0))
}

fn list(svc: &mut ProcService<RecordingShare>, path: &str, rbytes: u32) -> Response {
    send(
        svc,
        mock_message(IoOp::Info, info::INFO_LIST_ALL, SESSION, path_payload(path), rbytes),
    )
}

fn refs(svc: &ProcService<RecordingShare>, path: &str) -> u32 {
    let id = svc.namespace().get_file(None, path).unwrap();
    svc.namespace().file(id).unwrap().refs()
}

fn state(svc: &ProcService<RecordingShare>) -> ConnectionState {
    svc.connections().get(SessionId(SESSION)).unwrap().state()
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn test_unknown_operation_is_invalid() {
    let mut svc = booted();
    let mut msg = mock_message(IoOp::Read, 0, SESSION, Vec::new(), 0);
    msg.header = IoHeader {
        op: 0x99,
        ..msg.header
    };
    assert_eq!(send(&mut svc, msg).status, status::E_INVAL);
}

#[test]
fn test_request_from_unattached_session() {
    let mut svc = booted();
    let msg = mock_message(IoOp::Read, 0, 99, Vec::new(), 16);
    assert_eq!(send(&mut svc, msg).status, status::E_ERROR);
}

#[test]
fn test_runtime_replies_once_per_request() {
    let mut svc = booted();
    let mut channel = QueueChannel::new([
        Event::Attach(SessionId(9)),
        Event::Io(mock_message(IoOp::Open, open::O_RDONLY, 9, path_payload("/sys"), 0)),
        Event::Io(mock_message(IoOp::Read, 0, 9, Vec::new(), 4)),
        Event::Io(mock_message(IoOp::Close, 0, 9, Vec::new(), 0)),
        Event::Detach(SessionId(9)),
    ]);
    let stats = ServerRuntime::new(svc.config().context())
        .run(&mut svc, &mut channel)
        .unwrap();

    assert_eq!(stats.requests, 3);
    assert_eq!(channel.replies.len(), 3);
    assert_eq!(channel.replies[1].1.payload, b"Vers");
    assert!(svc.connections().get(SessionId(9)).is_none());
    assert_eq!(refs(&svc, "/sys"), 0);
}

#[test]
fn test_double_attach_rejected() {
    let mut svc = booted();
    assert!(svc
        .on_attach(&ServerContext::default(), SessionId(SESSION))
        .is_err());
    assert_eq!(svc.connections().len(), 1);
}

#[test]
fn test_init_rejects_invalid_config() {
    let config = ServerConfig {
        workers: 2,
        ..ServerConfig::default()
    };
    let mut svc = ProcService::new(config, RecordingShare::default());
    assert!(svc.init(&ServerContext::default()).is_err());
}

// =============================================================================
// List
// =============================================================================

#[test]
fn test_list_root() {
    let mut svc = booted();
    let reply = list(&mut svc, "/", 2048);
    assert_eq!(reply.status, status::E_OK);

    let mut entries = decode_entries(&reply.payload).unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let sys_len = svc
        .namespace()
        .file(svc.namespace().get_file(None, "/sys").unwrap())
        .unwrap()
        .size();
    let dev_len = svc
        .namespace()
        .file(svc.namespace().get_file(None, "/devices").unwrap())
        .unwrap()
        .size();
    assert_eq!(
        entries,
        vec![
            DirEntry::directory("boot"),
            DirEntry::file("devices", dev_len as u64),
            DirEntry::file("sys", sys_len as u64),
        ]
    );
}

#[test]
fn test_list_directories_before_files() {
    let mut svc = booted();
    let entries = decode_entries(&list(&mut svc, "/", 2048).payload).unwrap();
    assert!(entries[0].is_directory());
    assert!(entries[1..].iter().all(|e| !e.is_directory()));
}

#[test]
fn test_list_boot_dir() {
    let mut svc = booted();
    let entries = decode_entries(&list(&mut svc, "/boot", 2048).payload).unwrap();
    assert_eq!(entries, vec![DirEntry::file("echo", 128)]);
}

#[test]
fn test_list_file_or_missing_is_invalid_path() {
    let mut svc = booted();
    assert_eq!(list(&mut svc, "/sys", 2048).status, status::E_INVAL);
    assert_eq!(list(&mut svc, "/nope", 2048).status, status::E_INVAL);
}

#[test]
fn test_list_relative_path_is_invalid() {
    let mut svc = booted();
    assert_eq!(list(&mut svc, "boot", 2048).status, status::E_INVAL);
    assert_eq!(list(&mut svc, "", 2048).status, status::E_INVAL);
}

#[test]
fn test_list_wrong_code() {
    let mut svc = booted();
    let msg = mock_message(IoOp::Info, 0, SESSION, path_payload("/"), 2048);
    assert_eq!(send(&mut svc, msg).status, status::E_INVAL);
}

#[test]
fn test_list_returns_whole_entries_only() {
    let mut svc = booted();
    // "boot" directory entry is 4 + 2 + 4 + 1 = 11 bytes
    let reply = list(&mut svc, "/", 12);
    assert_eq!(reply.payload.len(), 11);
    assert_eq!(
        decode_entries(&reply.payload).unwrap(),
        vec![DirEntry::directory("boot")]
    );
}

// =============================================================================
// Open / Close
// =============================================================================

#[test]
fn test_open_read_advances_seek() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "/boot/echo", open::O_RDONLY).status,
        status::E_OK
    );

    let reply = read(&mut svc, 50);
    assert_eq!(reply.status, 50);
    assert_eq!(reply.payload, echo_bytes()[..50]);

    let conn = svc.connections().get(SessionId(SESSION)).unwrap();
    assert_eq!(conn.seek(), 50);
    assert_eq!(conn.access(), Some(OpenMode::ReadOnly));
    assert_eq!(refs(&svc, "/boot/echo"), 1);
}

#[test]
fn test_second_open_is_busy() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    assert_eq!(
        open_path(&mut svc, "/sys", open::O_RDONLY).status,
        status::E_BUSY
    );
    assert_eq!(refs(&svc, "/sys"), 0);
}

#[test]
fn test_open_missing_without_create() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "/tmp/x", open::O_RDWR).status,
        status::E_NO_RES
    );
    assert!(svc.connections().get(SessionId(SESSION)).unwrap().is_closed());
}

#[test]
fn test_open_relative_path_is_invalid() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "boot/echo", open::O_RDONLY).status,
        status::E_INVAL
    );
    assert_eq!(
        open_path(&mut svc, "tmp/x", open::O_RDWR | open::O_CREAT).status,
        status::E_INVAL
    );
    assert_eq!(refs(&svc, "/boot/echo"), 0);
    assert!(svc.namespace().get_file(None, "/tmp/x").is_none());
    assert!(svc.connections().get(SessionId(SESSION)).unwrap().is_closed());
}

#[test]
fn test_open_create_builds_parents() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "/a/b/c", open::O_RDWR | open::O_CREAT).status,
        status::E_OK
    );

    let ns = svc.namespace();
    let (b, rest) = ns.resolve(None, "/a/b");
    assert_eq!(rest, None);
    assert_eq!(ns.dir(b).unwrap().name(), "b");
    let parent = ns.dir(b).unwrap().parent().unwrap();
    assert_eq!(ns.dir(parent).unwrap().name(), "a");

    let file = ns.file(ns.get_file(None, "/a/b/c").unwrap()).unwrap();
    assert_eq!(file.size(), 0);
    assert_eq!(file.access(), AccessFlags::created());
    assert_eq!(file.refs(), 1);
}

#[test]
fn test_open_create_existing_opens_it() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "/boot/echo", open::O_RDWR | open::O_CREAT).status,
        status::E_OK
    );
    assert_eq!(svc.namespace().file_count(), 3);
}

#[test]
fn test_open_create_on_directory_fails() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "/boot", open::O_RDWR | open::O_CREAT).status,
        status::E_INVAL
    );
}

#[test]
fn test_open_read_only_file_for_write_denied() {
    let mut svc = booted();
    assert_eq!(
        open_path(&mut svc, "/sys", open::O_RDWR).status,
        status::E_ACCESS
    );
    assert_eq!(refs(&svc, "/sys"), 0);
    assert!(svc.connections().get(SessionId(SESSION)).unwrap().is_closed());
}

#[test]
fn test_close_releases_reference() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    assert_eq!(close(&mut svc).status, status::E_OK);
    assert_eq!(refs(&svc, "/boot/echo"), 0);

    let conn = svc.connections().get(SessionId(SESSION)).unwrap();
    assert!(conn.is_closed());
    assert_eq!(conn.file(), None);
    assert_eq!(conn.seek(), 0);
}

#[test]
fn test_close_is_idempotent() {
    let mut svc = booted();
    assert_eq!(close(&mut svc).status, status::E_OK);
    assert_eq!(close(&mut svc).status, status::E_OK);
    assert_eq!(svc.share().unshares, 0);
}

#[test]
fn test_reopen_after_close() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    read(&mut svc, 10);
    close(&mut svc);
    assert_eq!(open_path(&mut svc, "/sys", open::O_RDONLY).status, status::E_OK);
    assert_eq!(
        svc.connections().get(SessionId(SESSION)).unwrap().seek(),
        0
    );
}

// =============================================================================
// Read / Write / Seek
// =============================================================================

#[test]
fn test_closed_connection_rejects_io() {
    let mut svc = booted();
    assert_eq!(read(&mut svc, 8).status, status::E_ERROR);
    assert_eq!(write(&mut svc, b"x").status, status::E_ERROR);
    assert_eq!(seek_to(&mut svc, 0, seek::SEEK_SET).status, status::E_ERROR);
    assert_eq!(truncate(&mut svc, 4096).status, status::E_ERROR);
    assert_eq!(share(&mut svc).status, status::E_STATE);
}

#[test]
fn test_read_at_end_returns_nothing() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    seek_to(&mut svc, 500, seek::SEEK_SET);
    let reply = read(&mut svc, 16);
    assert_eq!(reply.status, 0);
    assert!(reply.payload.is_empty());
    assert_eq!(
        svc.connections().get(SessionId(SESSION)).unwrap().seek(),
        500
    );
}

#[test]
fn test_read_is_clipped_to_size() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    seek_to(&mut svc, 120, seek::SEEK_SET);
    let reply = read(&mut svc, 64);
    assert_eq!(reply.status, 8);
    assert_eq!(reply.payload, echo_bytes()[120..]);
}

#[test]
fn test_write_on_read_only_connection_denied() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    assert_eq!(write(&mut svc, b"abc").status, status::E_ACCESS);
}

#[test]
fn test_read_on_write_only_connection_denied() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_WRONLY);
    assert_eq!(read(&mut svc, 4).status, status::E_ACCESS);
    assert_eq!(write(&mut svc, b"abc").status, 3);
}

#[test]
fn test_write_then_read_back() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    seek_to(&mut svc, 10, seek::SEEK_SET);
    assert_eq!(write(&mut svc, b"hello").status, 5);
    assert_eq!(
        svc.connections().get(SessionId(SESSION)).unwrap().seek(),
        15
    );

    seek_to(&mut svc, 10, seek::SEEK_SET);
    assert_eq!(read(&mut svc, 5).payload, b"hello");
}

#[test]
fn test_write_never_grows_file() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    seek_to(&mut svc, 120, seek::SEEK_SET);
    assert_eq!(write(&mut svc, &[0xFF; 20]).status, 8);

    seek_to(&mut svc, 200, seek::SEEK_SET);
    assert_eq!(write(&mut svc, b"zz").status, 0);

    let id = svc.namespace().get_file(None, "/boot/echo").unwrap();
    assert_eq!(svc.namespace().file(id).unwrap().size(), 128);
}

#[test]
fn test_write_to_new_empty_file_writes_nothing() {
    let mut svc = booted();
    open_path(&mut svc, "/tmp/new", open::O_RDWR | open::O_CREAT);
    assert_eq!(write(&mut svc, b"data").status, 0);
}

#[test]
fn test_seek_modes() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);

    let reply = seek_to(&mut svc, 16, seek::SEEK_SET);
    assert_eq!(reply.status, status::E_OK);
    assert_eq!(reply.payload, 16u64.to_le_bytes());

    assert_eq!(seek_to(&mut svc, 4, seek::SEEK_CUR).payload, 20u64.to_le_bytes());
    assert_eq!(seek_to(&mut svc, -8, seek::SEEK_END).payload, 120u64.to_le_bytes());
    assert_eq!(seek_to(&mut svc, 100, seek::SEEK_END).payload, 228u64.to_le_bytes());
}

#[test]
fn test_seek_before_start_rejected() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    seek_to(&mut svc, 10, seek::SEEK_SET);
    assert_eq!(seek_to(&mut svc, -11, seek::SEEK_CUR).status, status::E_INVAL);
    assert_eq!(
        svc.connections().get(SessionId(SESSION)).unwrap().seek(),
        10
    );
}

#[test]
fn test_seek_bad_mode_or_payload() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    assert_eq!(seek_to(&mut svc, 0, 9).status, status::E_INVAL);
    let short = mock_message(IoOp::Seek, seek::SEEK_SET, SESSION, vec![1, 2], 8);
    assert_eq!(send(&mut svc, short).status, status::E_INVAL);
}

// =============================================================================
// Truncate
// =============================================================================

#[test]
fn test_truncate_rounds_to_page() {
    let mut svc = booted();
    open_path(&mut svc, "/tmp/buf", open::O_RDWR | open::O_CREAT);
    assert_eq!(truncate(&mut svc, 100).status, status::E_OK);

    let id = svc.namespace().get_file(None, "/tmp/buf").unwrap();
    assert_eq!(svc.namespace().file(id).unwrap().size(), 4096);
    assert_eq!(write(&mut svc, b"grown").status, 5);
}

#[test]
fn test_truncate_accepts_u32_payload() {
    let mut svc = booted();
    open_path(&mut svc, "/tmp/buf", open::O_RDWR | open::O_CREAT);
    let msg = mock_message(IoOp::Truncate, 0, SESSION, 5000u32.to_le_bytes().to_vec(), 0);
    assert_eq!(send(&mut svc, msg).status, status::E_OK);
    let id = svc.namespace().get_file(None, "/tmp/buf").unwrap();
    assert_eq!(svc.namespace().file(id).unwrap().size(), 8192);
}

#[test]
fn test_truncate_without_map_denied() {
    let mut svc = booted();
    open_path(&mut svc, "/sys", open::O_RDONLY);
    let id = svc.namespace().get_file(None, "/sys").unwrap();
    let before = svc.namespace().file(id).unwrap().data().to_vec();

    assert_eq!(truncate(&mut svc, 8192).status, status::E_ACCESS);
    assert_eq!(svc.namespace().file(id).unwrap().data(), &before[..]);
}

#[test]
fn test_truncate_zero_and_garbled_size() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    assert_eq!(truncate(&mut svc, 0).status, status::E_INVAL);
    let msg = mock_message(IoOp::Truncate, 0, SESSION, vec![1, 2, 3], 0);
    assert_eq!(send(&mut svc, msg).status, status::E_INVAL);
}

#[test]
fn test_truncate_over_limit() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    let limit = svc.config().max_file_size;
    assert_eq!(truncate(&mut svc, limit + 1).status, status::E_NO_MEM);
    let id = svc.namespace().get_file(None, "/boot/echo").unwrap();
    assert_eq!(svc.namespace().file(id).unwrap().size(), 128);
}

// =============================================================================
// Share
// =============================================================================

#[test]
fn test_share_twice_grants_once() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    assert_eq!(share(&mut svc).status, status::E_OK);
    assert_eq!(share(&mut svc).status, status::E_OK);

    assert_eq!(svc.share().shares, 1);
    assert_eq!(svc.share().grants.get(&SessionId(SESSION)).map(|g| g.1), Some(128));
    assert!(matches!(state(&svc), ConnectionState::Mapped { .. }));
}

#[test]
fn test_share_after_truncate_regrants() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    share(&mut svc);
    let ConnectionState::Mapped { generation: Some(first) } = state(&svc) else {
        panic!("not mapped");
    };

    assert_eq!(truncate(&mut svc, 8192).status, status::E_OK);
    assert_eq!(share(&mut svc).status, status::E_OK);

    let ConnectionState::Mapped { generation: Some(second) } = state(&svc) else {
        panic!("not mapped");
    };
    assert_ne!(first, second);
    assert_eq!(svc.share().shares, 2);
    assert_eq!(svc.share().unshares, 1);
    assert_eq!(svc.share().grants.get(&SessionId(SESSION)), Some(&(second, 8192)));
}

#[test]
fn test_share_requires_mappable_file() {
    let mut svc = booted();
    open_path(&mut svc, "/devices", open::O_RDONLY);
    assert_eq!(share(&mut svc).status, status::E_ACCESS);
    assert_eq!(state(&svc), ConnectionState::Open);
}

#[test]
fn test_share_failure_leaves_connection_open() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    svc.share.fail_next = true;
    assert_eq!(share(&mut svc).status, VfsError::ResourceExhausted.status());
    assert_eq!(state(&svc), ConnectionState::Open);
    assert_eq!(share(&mut svc).status, status::E_OK);
}

#[test]
fn test_failed_regrant_after_truncate_holds_no_grant() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    share(&mut svc);
    assert_eq!(truncate(&mut svc, 8192).status, status::E_OK);

    svc.share.fail_next = true;
    assert_eq!(share(&mut svc).status, VfsError::ResourceExhausted.status());
    assert_eq!(state(&svc), ConnectionState::Mapped { generation: None });
    assert!(svc.share().grants.is_empty());
    assert_eq!(svc.share().unshares, 1);

    close(&mut svc);
    assert_eq!(svc.share().unshares, 1);
    assert_eq!(state(&svc), ConnectionState::Closed);
    assert_eq!(refs(&svc, "/boot/echo"), 0);
}

#[test]
fn test_share_retries_after_failed_regrant() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    share(&mut svc);
    truncate(&mut svc, 8192);
    svc.share.fail_next = true;
    share(&mut svc);

    assert_eq!(share(&mut svc).status, status::E_OK);
    assert!(matches!(
        state(&svc),
        ConnectionState::Mapped { generation: Some(_) }
    ));
    assert_eq!(svc.share().grants.get(&SessionId(SESSION)).map(|g| g.1), Some(8192));
    assert_eq!(svc.share().unshares, 1);
}

#[test]
fn test_close_mapped_revokes_grant() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    share(&mut svc);
    close(&mut svc);

    assert!(svc.share().grants.is_empty());
    assert_eq!(svc.share().unshares, 1);
    assert_eq!(refs(&svc, "/boot/echo"), 0);
    assert_eq!(state(&svc), ConnectionState::Closed);
}

// =============================================================================
// Detach
// =============================================================================

#[test]
fn test_detach_mapped_releases_everything() {
    let mut svc = booted();
    open_path(&mut svc, "/boot/echo", open::O_RDWR);
    share(&mut svc);
    assert_eq!(refs(&svc, "/boot/echo"), 1);

    svc.on_detach(&ServerContext::default(), SessionId(SESSION))
        .unwrap();
    assert!(svc.share().grants.is_empty());
    assert_eq!(refs(&svc, "/boot/echo"), 0);
    assert!(svc.connections().is_empty());
}

#[test]
fn test_detach_unknown_session() {
    let mut svc = booted();
    assert!(svc
        .on_detach(&ServerContext::default(), SessionId(1234))
        .is_err());
}

#[test]
fn test_two_sessions_share_one_file() {
    let mut svc = booted();
    svc.on_attach(&ServerContext::default(), SessionId(8))
        .unwrap();
    open_path(&mut svc, "/boot/echo", open::O_RDONLY);
    let other = mock_message(IoOp::Open, open::O_RDONLY, 8, path_payload("/boot/echo"), 0);
    assert_eq!(send(&mut svc, other).status, status::E_OK);
    assert_eq!(refs(&svc, "/boot/echo"), 2);

    svc.on_detach(&ServerContext::default(), SessionId(8))
        .unwrap();
    assert_eq!(refs(&svc, "/boot/echo"), 1);
    assert_eq!(svc.report().map(|r| r.boot_files.clone()), Some(vec![String::from("/boot/echo")]));
}
