//! Server-rendered HTML for the browser surface
//!
//! One page: a sidebar form and a main pane that is either the catalog
//! list or the detail view with the multi-track player. Audio is
//! referenced by URL and streamed by the file routes.

use crate::jobs::JobSnapshot;
use crate::session::Notice;
use stemdeck_core::catalog::{TrackEntry, FULL_MIX_FILE, RHYTHM_MIX_FILE};

const STYLE: &str = r#"
  * { box-sizing: border-box; }
  body {
    margin: 0; display: flex; min-height: 100vh;
    background: #0e1117; color: #fafafa;
    font-family: -apple-system, 'Segoe UI', Roboto, sans-serif;
  }
  aside {
    width: 280px; padding: 24px; background: #171a21;
    border-right: 1px solid #30343d; flex-shrink: 0;
  }
  main { flex: 1; padding: 32px; max-width: 900px; }
  h1 { font-size: 20px; margin: 0 0 24px; }
  h2 { font-size: 18px; margin: 0; }
  h3 { font-size: 15px; margin: 24px 0 12px; }
  input[type=text] {
    width: 100%; padding: 8px 10px; margin-bottom: 12px;
    background: #0e1117; color: #fafafa;
    border: 1px solid #30343d; border-radius: 6px;
  }
  button {
    padding: 8px 16px; border: none; border-radius: 6px;
    background: #2196f3; color: white; font-weight: 600; cursor: pointer;
  }
  button:hover { background: #1976d2; }
  button:disabled { background: #555; cursor: not-allowed; }
  button.danger { background: #ff4b4b; }
  button.ghost { background: #262730; }
  form { margin: 0; }
  .wide { width: 100%; }
  .card {
    background: #262730; border: 1px solid #30343d; border-radius: 10px;
    padding: 16px; margin-bottom: 12px;
    display: flex; align-items: center; justify-content: space-between;
  }
  .caption { color: #9aa0ab; font-size: 13px; margin-top: 4px; }
  .notice { padding: 10px 14px; border-radius: 8px; margin-bottom: 20px; }
  .notice.success { background: #15351f; border: 1px solid #2e7d32; }
  .notice.info { background: #132a3d; border: 1px solid #2196f3; }
  .notice.error { background: #3d1313; border: 1px solid #ff4b4b; }
  .header-row { display: flex; align-items: center; gap: 12px; margin-bottom: 8px; }
  .header-row h2 { flex: 1; }
  .player { background: #262730; border: 1px solid #30343d; border-radius: 12px; padding: 20px; }
  .controls { display: flex; gap: 14px; align-items: center; margin-bottom: 20px; }
  .controls input[type=range] { flex: 1; cursor: pointer; }
  .track-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
  .track-card {
    background: #0e1117; border: 1px solid #30343d; border-radius: 8px;
    padding: 12px 14px; display: flex; align-items: center; justify-content: space-between;
  }
  .track-name { font-weight: 600; font-size: 13px; }
  a.download { color: #2196f3; font-size: 13px; text-decoration: none; }
  audio { width: 100%; margin-top: 8px; }
  .busy { color: #9aa0ab; font-size: 13px; margin-top: 10px; }
"#;

const PLAYER_SCRIPT: &str = r#"
  const tracks = document.querySelectorAll('.player audio');
  const progress = document.getElementById('progressBar');
  const playBtn = document.getElementById('mainPlayBtn');
  let isPlaying = false;

  function playAll() {
    if (!isPlaying) {
      tracks.forEach(t => t.play());
      playBtn.innerText = 'Pause';
    } else {
      tracks.forEach(t => t.pause());
      playBtn.innerText = 'Play';
    }
    isPlaying = !isPlaying;
  }

  function seekAll(val) {
    if (tracks.length > 0 && tracks[0].duration) {
      const time = (val / 100) * tracks[0].duration;
      tracks.forEach(t => t.currentTime = time);
    }
  }

  function updateProgress() {
    if (tracks.length > 0 && tracks[0].duration) {
      progress.value = (tracks[0].currentTime / tracks[0].duration) * 100;
    }
  }

  function toggleMute(name) {
    const audio = document.getElementById('audio_' + name);
    const chk = document.getElementById('chk_' + name);
    audio.muted = !chk.checked;
  }
"#;

const POLL_SCRIPT: &str = r#"
  setInterval(async () => {
    try {
      const res = await fetch('/status');
      const s = await res.json();
      if (!s.processing) location.reload();
      else document.getElementById('jobStage').innerText = s.stage;
    } catch (_) {}
  }, 2000);
"#;

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Full page shell around a rendered main pane.
pub fn page(body: &str, job: Option<&JobSnapshot>, notice: Option<&Notice>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>stemdeck</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<aside>\n<h1>stemdeck</h1>\n");
    html.push_str(&sidebar(job));
    html.push_str("</aside>\n<main>\n");

    if let Some(notice) = notice {
        html.push_str(&notice_banner(notice));
    }
    html.push_str(body);
    html.push_str("\n</main>\n");

    if job.is_some() {
        html.push_str("<script>");
        html.push_str(POLL_SCRIPT);
        html.push_str("</script>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn sidebar(job: Option<&JobSnapshot>) -> String {
    match job {
        Some(job) => format!(
            concat!(
                "<p>Processing <strong>{name}</strong>&hellip;</p>\n",
                "<p class=\"busy\" id=\"jobStage\">{stage}</p>\n",
                "<form method=\"post\" action=\"/cancel\">",
                "<button type=\"submit\" class=\"danger wide\">Cancel</button>",
                "</form>\n"
            ),
            name = escape(&job.name),
            stage = escape(&job.stage),
        ),
        None => concat!(
            "<form method=\"post\" action=\"/process\">\n",
            "<label>Source URL</label>\n",
            "<input type=\"text\" name=\"url\" placeholder=\"youtube.com/watch?v=...\">\n",
            "<label>Track name</label>\n",
            "<input type=\"text\" name=\"name\" placeholder=\"My Song\">\n",
            "<button type=\"submit\" class=\"wide\">Start processing</button>\n",
            "</form>\n"
        )
        .to_string(),
    }
}

fn notice_banner(notice: &Notice) -> String {
    let (class, text) = match notice {
        Notice::Success(text) => ("success", text),
        Notice::Info(text) => ("info", text),
        Notice::Error(text) => ("error", text),
    };
    format!("<div class=\"notice {class}\">{}</div>\n", escape(text))
}

/// Catalog list pane.
pub fn list(entries: &[TrackEntry]) -> String {
    let mut html = String::from("<h2>My tracks</h2>\n<p class=\"caption\">Pick a track to open the multi-track mixer</p>\n");

    if entries.is_empty() {
        html.push_str("<p>No tracks processed yet. Use the sidebar to get started.</p>\n");
        return html;
    }

    for entry in entries {
        let name = escape(&entry.name);
        html.push_str(&format!(
            concat!(
                "<div class=\"card\">\n",
                "<div><strong>{name}</strong>",
                "<div class=\"caption\">{count} tracks &middot; {modified}</div></div>\n",
                "<form method=\"post\" action=\"/open/{name}\">",
                "<button type=\"submit\">Open</button></form>\n",
                "</div>\n"
            ),
            name = name,
            count = entry.file_count(),
            modified = entry.modified.format("%Y-%m-%d %H:%M"),
        ));
    }
    html
}

/// Detail pane for one track: mixer, automatic mixes, per-file downloads.
pub fn detail(entry: &TrackEntry) -> String {
    let name = escape(&entry.name);
    let mut html = format!(
        concat!(
            "<div class=\"header-row\">\n",
            "<form method=\"post\" action=\"/back\">",
            "<button type=\"submit\" class=\"ghost\">&larr; Back</button></form>\n",
            "<h2>{name}</h2>\n",
            "<form method=\"post\" action=\"/delete/{name}\" ",
            "onsubmit=\"return confirm('Delete {name}? This cannot be undone.')\">",
            "<button type=\"submit\" class=\"danger\">Delete</button></form>\n",
            "</div>\n"
        ),
        name = name,
    );

    if entry.has_all_stems() {
        html.push_str(&player(entry));
    } else {
        html.push_str("<p class=\"caption\">Some stems are missing; the mixer needs all four.</p>\n");
    }

    let mixes: Vec<(&str, &str)> = [
        (RHYTHM_MIX_FILE, "Drums + bass", entry.has_rhythm_mix),
        (FULL_MIX_FILE, "Vocals + drums + bass", entry.has_full_mix),
    ]
    .into_iter()
    .filter(|(_, _, present)| *present)
    .map(|(file, label, _)| (file, label))
    .collect();

    if !mixes.is_empty() {
        html.push_str("<h3>Automatic mixes</h3>\n");
        for (file, label) in mixes {
            html.push_str(&format!(
                concat!(
                    "<div class=\"card\"><div style=\"flex:1\">\n",
                    "<span class=\"track-name\">{label}</span>\n",
                    "<audio controls preload=\"none\" src=\"/audio/{name}/{file}\"></audio>\n",
                    "</div>\n",
                    "<a class=\"download\" href=\"/download/{name}/{file}\">Download</a>\n",
                    "</div>\n"
                ),
                label = label,
                name = name,
                file = file,
            ));
        }
    }

    html.push_str("<h3>Individual stems</h3>\n<div class=\"track-grid\">\n");
    for stem in &entry.stems {
        html.push_str(&format!(
            concat!(
                "<div class=\"track-card\">\n",
                "<span class=\"track-name\">{label}</span>\n",
                "<a class=\"download\" href=\"/download/{name}/{stem}.mp3\">Download</a>\n",
                "</div>\n"
            ),
            label = stem.to_uppercase(),
            name = name,
            stem = stem,
        ));
    }
    html.push_str("</div>\n");
    html
}

/// The multi-track mixer: per-stem mute toggles, one shared transport.
fn player(entry: &TrackEntry) -> String {
    let name = escape(&entry.name);
    let mut html = String::from("<div class=\"player\">\n<h3 style=\"margin-top:0\">Multi-track mixer</h3>\n");
    html.push_str(concat!(
        "<div class=\"controls\">\n",
        "<button id=\"mainPlayBtn\" onclick=\"playAll()\">Play</button>\n",
        "<input type=\"range\" id=\"progressBar\" value=\"0\" oninput=\"seekAll(this.value)\">\n",
        "</div>\n<div class=\"track-grid\">\n"
    ));

    for stem in &entry.stems {
        html.push_str(&format!(
            concat!(
                "<div class=\"track-card\">\n",
                "<span class=\"track-name\">{label}</span>\n",
                "<input type=\"checkbox\" id=\"chk_{stem}\" checked onchange=\"toggleMute('{stem}')\">\n",
                "<audio id=\"audio_{stem}\" src=\"/audio/{name}/{stem}.mp3\" ",
                "preload=\"auto\" ontimeupdate=\"updateProgress()\"></audio>\n",
                "</div>\n"
            ),
            label = stem.to_uppercase(),
            stem = stem,
            name = name,
        ));
    }

    html.push_str("</div>\n</div>\n<script>");
    html.push_str(PLAYER_SCRIPT);
    html.push_str("</script>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::PathBuf;

    fn entry(stems: Vec<&'static str>, rhythm: bool, full: bool) -> TrackEntry {
        TrackEntry {
            name: "Test_Song".to_string(),
            path: PathBuf::from("/work/separated/htdemucs/Test_Song"),
            stems,
            has_rhythm_mix: rhythm,
            has_full_mix: full,
            modified: Local::now(),
        }
    }

    #[test]
    fn test_detail_with_all_stems_renders_mixer() {
        let html = detail(&entry(vec!["vocals", "drums", "bass", "other"], true, true));
        assert!(html.contains("Multi-track mixer"));
        assert_eq!(html.matches("<audio id=\"audio_").count(), 4);
        assert!(html.contains("/audio/Test_Song/vocals.mp3"));
        assert!(html.contains("/download/Test_Song/mixed_audio.mp3"));
        assert!(html.contains("/download/Test_Song/mixed_audio_voice.mp3"));
    }

    #[test]
    fn test_detail_vocals_only_has_no_mixer_or_mixes() {
        let html = detail(&entry(vec!["vocals"], false, false));
        assert!(!html.contains("Multi-track mixer"));
        assert!(!html.contains("mixed_audio"));
        assert!(html.contains("/download/Test_Song/vocals.mp3"));
    }

    #[test]
    fn test_list_empty_state() {
        assert!(list(&[]).contains("No tracks processed yet"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_page_polls_only_while_processing() {
        let job = JobSnapshot {
            id: uuid::Uuid::new_v4(),
            name: "Test_Song".to_string(),
            stage: "separating Test_Song".to_string(),
        };
        assert!(page("<p></p>", Some(&job), None).contains("setInterval"));
        assert!(!page("<p></p>", None, None).contains("setInterval"));
    }
}
