use anyhow::Result;
use std::process::Command;
use which::which;

pub async fn run() -> Result<()> {
    println!("stemdeck dependency check\n");

    let mut all_ok = true;

    // Check FFmpeg
    print!("ffmpeg:  ");
    match which("ffmpeg") {
        Ok(path) => {
            let version = Command::new(&path).args(["-version"]).output();
            match version {
                Ok(out) => {
                    let first_line = String::from_utf8_lossy(&out.stdout)
                        .lines()
                        .next()
                        .unwrap_or("")
                        .to_string();
                    let version_part = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                    println!("OK ({version_part})");
                }
                Err(_) => {
                    println!("FOUND but failed to get version");
                    all_ok = false;
                }
            }
        }
        Err(_) => {
            println!("NOT FOUND");
            println!("         Install with: brew install ffmpeg");
            all_ok = false;
        }
    }

    // Check demucs (no --version flag; a clean --help is good enough)
    print!("demucs:  ");
    match which("demucs") {
        Ok(path) => {
            let help = Command::new(&path).arg("--help").output();
            match help {
                Ok(out) if out.status.success() => println!("OK"),
                _ => {
                    println!("FOUND but not responding");
                    all_ok = false;
                }
            }
        }
        Err(_) => {
            println!("NOT FOUND");
            println!("         Install with: pip install demucs");
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}
