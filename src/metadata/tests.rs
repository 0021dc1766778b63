use super::*;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn ticket(index: usize, serial: u64) -> Ticket {
    Ticket { index, serial }
}

#[test]
fn unreadable_file_falls_back_to_filename() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Morning Song.mp3");
    fs::write(&path, b"definitely not audio").unwrap();

    let info = read_track_info(&path);
    assert_eq!(info.title, "Morning Song");
    assert_eq!(info.artist, None);
    assert_eq!(info.album, None);
    assert!(info.cover_art.is_none());
}

#[test]
fn missing_file_falls_back_to_filename() {
    let info = read_track_info(Path::new("/nonexistent/dir/Track 07.flac"));
    assert_eq!(info, TrackInfo::fallback(Path::new("Track 07.flac")));
}

#[test]
fn latest_skips_queued_requests() {
    let (tx, rx) = mpsc::channel();
    for i in 1..4 {
        tx.send(Request {
            ticket: ticket(i, i as u64),
            path: PathBuf::from(format!("/m/{i}.mp3")),
        })
        .unwrap();
    }
    let first = Request {
        ticket: ticket(0, 0),
        path: PathBuf::from("/m/0.mp3"),
    };

    let picked = latest(first, &rx);
    assert_eq!(picked.ticket, ticket(3, 3));
    assert_eq!(picked.path, PathBuf::from("/m/3.mp3"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn fetcher_posts_tagged_result_to_engine_inbox() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.ogg");
    fs::write(&path, b"nope").unwrap();

    let (reply_tx, reply_rx) = mpsc::channel();
    let mut fetcher = MetadataFetcher::spawn(reply_tx).unwrap();
    fetcher.request(ticket(2, 11), &path);

    match reply_rx.recv_timeout(Duration::from_secs(5)) {
        Ok(EngineInput::Metadata { ticket: t, info }) => {
            assert_eq!(t, ticket(2, 11));
            assert_eq!(info.title, "broken");
        }
        Ok(_) => panic!("unexpected engine input"),
        Err(e) => panic!("no metadata delivered: {e}"),
    }
}
