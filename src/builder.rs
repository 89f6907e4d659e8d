use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    error::{DriftwallError, DriftwallResult},
    schedule::has_image_extension,
};

/// Seconds in one full cycle: the playlist always spans exactly 24 hours.
const SECONDS_IN_DAY: i64 = 86_400;
/// Fixed crossfade length between consecutive images.
const TRANSITION_DURATION: i64 = 1_800;
/// File written next to the source images.
const OUTPUT_FILE: &str = "dynamic_wallpaper.xml";

/// Generate a conforming schedule for every image in `dir` and write it to
/// `<dir>/dynamic_wallpaper.xml`. Returns the output path.
///
/// Images are sorted lexicographically and wired into a cycle: each gets a
/// static slot of `(86400 − n·1800) / n` seconds followed by a 1800-second
/// transition to the next, the last wrapping to the first. The anchor is
/// fixed at 2001-01-01T00:00:00, so every machine lands on the same cycle
/// position for the same local time of day.
pub fn build_playlist(dir: &Path) -> DriftwallResult<PathBuf> {
    let images = collect_images(dir)?;
    if images.len() < 2 {
        return Err(DriftwallError::InsufficientImages {
            found: images.len(),
        });
    }

    let out_path = dir.join(OUTPUT_FILE);
    let xml = playlist_xml(&images);
    std::fs::write(&out_path, xml)
        .with_context(|| format!("write playlist '{}'", out_path.display()))?;
    Ok(out_path)
}

fn collect_images(dir: &Path) -> DriftwallResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DriftwallError::invalid_directory(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("read directory '{}'", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}

fn playlist_xml(images: &[PathBuf]) -> String {
    let n = images.len() as i64;
    let static_duration = (SECONDS_IN_DAY - n * TRANSITION_DURATION) / n;

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<background>\n");
    xml.push_str("  <starttime>\n");
    xml.push_str("    <year>2001</year>\n");
    xml.push_str("    <month>1</month>\n");
    xml.push_str("    <day>1</day>\n");
    xml.push_str("    <hour>0</hour>\n");
    xml.push_str("    <minute>0</minute>\n");
    xml.push_str("    <second>0</second>\n");
    xml.push_str("  </starttime>\n\n");

    for (i, current) in images.iter().enumerate() {
        let next = &images[(i + 1) % images.len()];
        let current = xml_escape(&current.display().to_string());
        let next = xml_escape(&next.display().to_string());

        let _ = writeln!(xml, "  <static>");
        let _ = writeln!(xml, "    <duration>{static_duration}</duration>");
        let _ = writeln!(xml, "    <file>{current}</file>");
        let _ = writeln!(xml, "  </static>");
        let _ = writeln!(xml, "  <transition type=\"overlay\">");
        let _ = writeln!(xml, "    <duration>{TRANSITION_DURATION}</duration>");
        let _ = writeln!(xml, "    <from>{current}</from>");
        let _ = writeln!(xml, "    <to>{next}</to>");
        let _ = writeln!(xml, "  </transition>\n");
    }

    xml.push_str("</background>\n");
    xml
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Event, Timeline};

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
    fn three_images_span_exactly_one_day() {
        let tmp = temp_dir("builder_three");
        std::fs::create_dir_all(&tmp).unwrap();
        for name in ["b.jpg", "a.png", "c.JPEG", "notes.txt"] {
            std::fs::write(tmp.join(name), b"x").unwrap();
        }

        let out = build_playlist(&tmp).unwrap();
        let tl = Timeline::load(&out).unwrap();

        // (86400 - 3*1800) / 3 = 27000 per static, 3 statics + 3 transitions.
        assert_eq!(tl.len(), 6);
        assert_eq!(tl.total_duration(), SECONDS_IN_DAY);
        let statics: Vec<_> = tl
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Static { .. }))
            .collect();
        assert_eq!(statics.len(), 3);
        assert!(statics.iter().all(|e| e.duration() == 27_000));

        // Lexicographic order and cyclic wiring: last transition wraps to
        // the first image.
        let Some(Event::Static { file, .. }) = tl.get(0) else {
            panic!("first event should be static");
        };
        assert!(file.ends_with("a.png"));
        let Some(Event::Transition { from, to, .. }) = tl.get(5) else {
            panic!("last event should be a transition");
        };
        assert!(from.ends_with("c.JPEG"));
        assert!(to.ends_with("a.png"));

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn anchor_is_fixed_epoch() {
        let tmp = temp_dir("builder_anchor");
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("a.png"), b"x").unwrap();
        std::fs::write(tmp.join("b.png"), b"x").unwrap();

        let out = build_playlist(&tmp).unwrap();
        let tl = Timeline::load(&out).unwrap();
        assert_eq!(tl.anchor(), time::macros::datetime!(2001-01-01 00:00:00));

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn fewer_than_two_images_is_an_error() {
        let tmp = temp_dir("builder_one");
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("only.png"), b"x").unwrap();

        assert!(matches!(
            build_playlist(&tmp).unwrap_err(),
            DriftwallError::InsufficientImages { found: 1 }
        ));

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn non_directory_is_rejected() {
        let tmp = temp_dir("builder_nodir");
        assert!(matches!(
            build_playlist(&tmp).unwrap_err(),
            DriftwallError::InvalidDirectory(_)
        ));
    }
}
