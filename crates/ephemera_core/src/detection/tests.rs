//! Language detection tests.

use super::{detect_or_unknown, HeuristicDetector, LanguageDetector};
use crate::constants::UNKNOWN_LANGUAGE;

fn assert_detection_cases(cases: &[(&str, &str)]) {
    for (content, expected) in cases {
        assert_eq!(
            HeuristicDetector.detect(content),
            *expected,
            "content: {content}"
        );
    }
}

#[test]
fn heuristic_detects_common_languages() {
    let cases = [
        ("fn main() { let x = 1; }", "rust"),
        ("def main():\n    print('hi')", "python"),
        ("const x = () => console.log('hi');", "javascript"),
        ("package main\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}", "go"),
        ("#!/bin/bash\necho hello", "shell"),
        ("#!/usr/bin/env python3\nx = 1", "python"),
        ("name: app\nservices:\n  - web", "yaml"),
        ("[tool]\nname = \"demo\"\nversion = \"0.1.0\"", "toml"),
        ("{\"a\": 1, \"b\": [true, null]}", "json"),
        ("<!DOCTYPE html>\n<html><body></body></html>", "html"),
        ("<?xml version=\"1.0\"?>\n<root><a/></root>", "xml"),
        ("SELECT id, name FROM users WHERE id = 1;", "sql"),
        ("#include <stdio.h>\nint main() { printf(\"hi\"); }", "c"),
        ("body { color: red; margin: 0; }", "css"),
        ("# Title\n\nSome prose here.", "markdown"),
    ];
    assert_detection_cases(cases.as_slice());
}

#[test]
fn ambiguous_content_is_unknown() {
    let cases = [
        ("x", UNKNOWN_LANGUAGE),
        ("just some plain text words", UNKNOWN_LANGUAGE),
        ("   \n\t ", UNKNOWN_LANGUAGE),
        ("{not json at all", UNKNOWN_LANGUAGE),
    ];
    assert_detection_cases(cases.as_slice());
}

#[test]
fn large_content_is_sampled_without_splitting_chars() {
    let mut content = String::from("{\"items\": [");
    while content.len() < 70 * 1024 {
        content.push_str("\"é\", ");
    }
    assert_eq!(HeuristicDetector.detect(&content), "json");
}

struct Blank;

impl LanguageDetector for Blank {
    fn detect(&self, _content: &str) -> String {
        "  ".to_string()
    }
}

struct Shouting;

impl LanguageDetector for Shouting {
    fn detect(&self, _content: &str) -> String {
        " Rust ".to_string()
    }
}

#[test]
fn detect_or_unknown_normalizes_detector_output() {
    assert_eq!(detect_or_unknown(&Blank, "anything"), UNKNOWN_LANGUAGE);
    assert_eq!(detect_or_unknown(&Shouting, "anything"), "rust");
}
