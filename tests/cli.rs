use std::fs;
use std::process::Command;

use tempfile::tempdir;

#[test]
fn cli_builds_cache_tree_and_reports_unresolved_references() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("img")).unwrap();
    fs::write(
        src.join("index.html"),
        r#"<script src="/app.js"></script><img src="/img/logo.png"><img src="/missing.png">"#,
    )
    .unwrap();
    fs::write(src.join("app.js"), "console.log(1);").unwrap();
    fs::write(src.join("img/logo.png"), b"\x89PNGDATA").unwrap();

    let out = dir.path().join("cache");
    let notfound = dir.path().join("recache.notfound");

    let status = Command::new(env!("CARGO_BIN_EXE_recache"))
        .arg(&src)
        .arg("--out")
        .arg(&out)
        .arg("--notfound-file")
        .arg(&notfound)
        .arg("--ignore-file")
        .arg(dir.path().join("recache.ignore"))
        .status()
        .expect("failed to run the recache binary");

    assert!(status.success());

    let emitted: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(emitted.iter().any(|n| n == "index.html"));
    assert!(emitted.iter().any(|n| n.starts_with("app.js_")));
    assert!(emitted.iter().any(|n| n.starts_with("logo.png")));

    let report = fs::read_to_string(&notfound).unwrap();
    assert!(report.contains("/missing.png"));

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("/missing.png"), "unresolved reference left unchanged");
}
