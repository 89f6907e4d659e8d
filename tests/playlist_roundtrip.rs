use std::path::PathBuf;

use time::Duration;

use driftwall::{Event, Timeline, builder::build_playlist, resolve};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "driftwall_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn built_playlist_loads_and_resolves() {
    let tmp = temp_dir("roundtrip");
    std::fs::create_dir_all(&tmp).unwrap();
    for name in ["dawn.png", "noon.jpg", "dusk.jpeg"] {
        std::fs::write(tmp.join(name), b"placeholder").unwrap();
    }

    let out = build_playlist(&tmp).unwrap();
    assert!(out.ends_with("dynamic_wallpaper.xml"));

    let tl = Timeline::load(&out).unwrap();
    assert_eq!(tl.len(), 6);
    assert_eq!(tl.total_duration(), 86_400);

    // Statics and transitions strictly alternate, starting with a static.
    for (i, event) in tl.events().iter().enumerate() {
        match event {
            Event::Static { duration, .. } => {
                assert_eq!(i % 2, 0);
                assert_eq!(*duration, 27_000);
            }
            Event::Transition { duration, from, to } => {
                assert_eq!(i % 2, 1);
                assert_eq!(*duration, 1_800);
                assert_ne!(from, to);
            }
        }
    }

    // The anchor predates "now" by decades; resolution still lands in range
    // anywhere in the day, and one full day later resolves identically.
    let t0 = tl.anchor();
    for offset in [0i64, 3_600, 27_000, 28_799, 28_800, 86_399] {
        let now = t0 + Duration::seconds(offset);
        let r = resolve(&tl, now).unwrap();
        assert!(r.index < tl.len());
        assert!(r.elapsed_in_event < tl.get(r.index).unwrap().duration());

        let tomorrow = resolve(&tl, now + Duration::days(1)).unwrap();
        assert_eq!(tomorrow, r);
    }

    std::fs::remove_dir_all(&tmp).ok();
}
