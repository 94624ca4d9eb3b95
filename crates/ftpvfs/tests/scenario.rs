//! End-to-end behavior of the filesystem over an in-memory FTP session.

use std::io::SeekFrom;
use std::time::{Duration, SystemTime};

use ftpvfs::constants::MODE_DIR;
use ftpvfs::{FileHandle, FtpFs, MemoryTransport, VfsError};

const A_TXT: &[u8] = b"hello, world";
const B_TXT: &[u8] = b"bytes";

fn remote() -> MemoryTransport {
    let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    MemoryTransport::new()
        .with_file_modified("/d/a.txt", A_TXT.to_vec(), when)
        .with_file("/d/b.txt", B_TXT.to_vec())
}

async fn read_all(handle: &mut Box<dyn FileHandle>) -> Vec<u8> {
    let mut out = Vec::new();
    handle.read_to_end(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn test_directory_listing() {
    let fs = FtpFs::new(remote());

    let dir = fs.open("/d").await.unwrap();
    let stat = dir.stat().unwrap();
    assert!(stat.is_dir());
    assert_eq!(stat.name, "/d");
    assert_eq!(stat.mode, MODE_DIR | 0o644);

    let entries = dir.readdir(0).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(entries[0].size, 12);
    assert_eq!(entries[1].size, 5);
    assert!(entries[0].mtime.is_some());
    assert!(entries[1].mtime.is_none());
    assert!(entries.iter().all(|e| e.is_file() && e.mode == 0o644));
}

#[tokio::test]
async fn test_read_whole_file_then_eof() {
    let fs = FtpFs::new(remote());

    let mut file = fs.open("/d/a.txt").await.unwrap();
    assert_eq!(file.stat().unwrap().size, 12);

    let mut buf = [0u8; 12];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await.unwrap();
        assert!(n > 0, "premature end of file");
        filled += n;
    }
    assert_eq!(&buf, A_TXT);

    let mut more = [0u8; 4];
    assert_eq!(file.read(&mut more).await.unwrap(), 0);
    file.close().await.unwrap();
}

#[tokio::test]
async fn test_seek_then_read_tail() {
    let fs = FtpFs::new(remote());

    let mut file = fs.open("/d/a.txt").await.unwrap();
    assert_eq!(read_all(&mut file).await, A_TXT);

    assert_eq!(file.seek(SeekFrom::Start(5)).unwrap(), 5);
    assert_eq!(read_all(&mut file).await, &A_TXT[5..]);
    file.close().await.unwrap();
}

#[tokio::test]
async fn test_range_request_pattern() {
    let transport = remote();
    let stats = transport.stats();
    let fs = FtpFs::new(transport);

    // Sniff the head, rewind, then serve the body: one transfer in total.
    let mut file = fs.open("/d/a.txt").await.unwrap();
    let mut head = [0u8; 5];
    assert_eq!(file.read(&mut head).await.unwrap(), 5);
    assert_eq!(file.seek(SeekFrom::Start(0)).unwrap(), 0);
    assert_eq!(read_all(&mut file).await, A_TXT);
    assert_eq!(stats.retrs(), 1);

    // Suffix range: jump to the last 3 bytes, which is still buffered.
    assert_eq!(file.seek(SeekFrom::End(-3)).unwrap(), 9);
    assert_eq!(read_all(&mut file).await, b"rld");
    assert_eq!(stats.retrs(), 1);
}

#[tokio::test]
async fn test_role_segregation() {
    let fs = FtpFs::new(remote());

    let mut dir = fs.open("/d").await.unwrap();
    let mut buf = [0u8; 1];
    assert!(matches!(dir.read(&mut buf).await, Err(VfsError::ReadOnDirectory(_))));
    assert!(matches!(dir.seek(SeekFrom::Start(0)), Err(VfsError::ReadOnDirectory(_))));

    let file = fs.open("/d/b.txt").await.unwrap();
    assert!(matches!(file.readdir(0), Err(VfsError::ReaddirOnFile(_))));
}

#[tokio::test]
async fn test_not_found_maps_to_io_not_found() {
    let fs = FtpFs::new(remote());
    let err = fs.open("/d/missing.txt").await.err().unwrap();
    assert!(err.is_not_found());
    let io_err: std::io::Error = err.into();
    assert_eq!(io_err.kind(), std::io::ErrorKind::NotFound);
}
