//! Simple decoder to inspect binary document files.

use std::fs;
use std::process::ExitCode;

use vdoc::{as_debug_string, as_pretty_json, decode_document, framed_len, Document};

fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: decode_file <file.bin>");
        return ExitCode::FAILURE;
    };

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("error: cannot read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let node = match decode_document(&bytes) {
        Ok(node) => node,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match framed_len(&bytes) {
        Ok(len) => println!("=== {path}: {len} bytes framed, {} on disk ===", bytes.len()),
        Err(_) => println!("=== {path} ==="),
    }

    println!("{}", as_pretty_json(&node));

    // If the file carries a versioned envelope, show its metadata.
    if node.exists("_/id") && node.exists("version") {
        let doc = Document::wrap(node, true);
        println!();
        println!("revision: {}", doc.id());
        println!("parent:   {}", doc.parent());
        println!("key:      {}", doc.key());
        println!("version:  {}", doc.version());
        println!("suppressed: {}", doc.suppressed());
        return ExitCode::SUCCESS;
    }

    println!();
    println!("wire layout: {}", as_debug_string(&node));
    ExitCode::SUCCESS
}
