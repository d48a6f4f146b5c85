//! Integration tests: whole-package audits over on-disk trees with fixture
//! scan evidence.

mod common;

use common::{license_tag, write, write_package, Workspace};
use ros_license_audit::copyright::render_copyright_file;
use ros_license_audit::engine::{EX_DATAERR, EX_OK, EX_USAGE};
use ros_license_audit::license::{InMemoryReferenceTexts, LicenseVocabulary};
use ros_license_audit::package::glob::all_files;
use ros_license_audit::{Check, PackageReport, Status};
use std::collections::BTreeSet;

fn outcome(report: &PackageReport, check: Check) -> (Status, String) {
    let o = report
        .outcomes
        .iter()
        .find(|o| o.check == check)
        .unwrap_or_else(|| panic!("{} missing", check.name()));
    (o.status, o.reason.clone())
}

#[test]
fn test_single_mit_package_passes() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "pkg", &[license_tag("MIT", Some("LICENSE"), None)]);
    write(&ws.root, "pkg/LICENSE", "MIT License\n");
    write(&ws.root, "pkg/src/main.cpp", "// SPDX-License-Identifier: MIT\n");

    let oracle = ws
        .oracle()
        .with_license_text("pkg/LICENSE", "MIT")
        .with_code("pkg/src/main.cpp", "MIT");
    let auditor = ws.auditor(oracle);
    let report = auditor.run(&ws.root).unwrap();

    assert_eq!(report.packages.len(), 1);
    let pkg = &report.packages[0];
    assert_eq!(pkg.name, "pkg");
    for o in &pkg.outcomes {
        assert_eq!(o.status, Status::Success, "{}: {}", o.check.name(), o.reason);
    }
    assert_eq!(auditor.exit_policy().exit_code(&report), EX_OK);
}

#[test]
fn test_undeclared_code_license_fails() {
    let ws = Workspace::new();
    write_package(
        &ws.root,
        "pkg",
        "pkg",
        &[license_tag("LGPL-2.1", Some("LICENSE"), None)],
    );
    write(&ws.root, "pkg/LICENSE", "lgpl\n");
    write(&ws.root, "pkg/src/a.cpp", "lgpl");
    write(&ws.root, "pkg/src/b.cpp", "apache");

    let oracle = ws
        .oracle()
        .with_license_text("pkg/LICENSE", "LGPL-2.1")
        .with_code("pkg/src/a.cpp", "LGPL-2.1")
        .with_code("pkg/src/b.cpp", "Apache-2.0");
    let auditor = ws.auditor(oracle);
    let report = auditor.run(&ws.root).unwrap();

    let pkg = &report.packages[0];
    let o = pkg
        .outcomes
        .iter()
        .find(|o| o.check == Check::LicensesInCode)
        .unwrap();
    assert_eq!(o.status, Status::Failure);
    assert_eq!(o.findings.len(), 1);
    assert_eq!(o.findings[0].entity, "src/b.cpp");
    assert_eq!(o.findings[0].reason, "Apache-2.0");
    assert_eq!(pkg.status, Status::Failure);
    assert_eq!(auditor.exit_policy().exit_code(&report), EX_DATAERR);
}

#[test]
fn test_unrecognized_tag_with_proven_text_warns() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "pkg", &[license_tag("BSD", Some("LICENSE"), None)]);
    write(&ws.root, "pkg/LICENSE", "Redistribution and use in source and binary forms\n");

    let oracle = ws.oracle().with_license_text("pkg/LICENSE", "BSD-3-Clause");
    let auditor = ws.auditor(oracle);
    let report = auditor.run(&ws.root).unwrap();
    let pkg = &report.packages[0];

    assert_eq!(outcome(pkg, Check::TagIsRecognized).0, Status::Warning);
    let (status, reason) = outcome(pkg, Check::LicenseTextExists);
    assert_eq!(status, Status::Warning);
    assert!(reason.contains("is of license BSD-3-Clause but tag is BSD."));
    assert_eq!(outcome(pkg, Check::LicenseFilesReferenced).0, Status::Warning);
    assert_eq!(pkg.status, Status::Warning);
    assert_eq!(auditor.exit_policy().exit_code(&report), EX_OK);
}

#[test]
fn test_recognized_tag_with_other_text_fails() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "pkg", &[license_tag("MIT", Some("LICENSE"), None)]);
    write(&ws.root, "pkg/LICENSE", "Apache License Version 2.0\n");

    let oracle = ws.oracle().with_license_text("pkg/LICENSE", "Apache-2.0");
    let report = ws.auditor(oracle).run(&ws.root).unwrap();

    let (status, reason) = outcome(&report.packages[0], Check::LicenseTextExists);
    assert_eq!(status, Status::Failure);
    assert!(reason.starts_with("The following license tags do not have a valid license text file:"));
}

#[test]
fn test_two_remainder_owners_fail_without_crashing() {
    let ws = Workspace::new();
    write_package(
        &ws.root,
        "broken",
        "broken",
        &[
            license_tag("MIT", Some("LICENSE"), None),
            license_tag("Apache-2.0", Some("LICENSE.apache"), None),
        ],
    );
    write_package(&ws.root, "fine", "fine", &[license_tag("MIT", Some("LICENSE"), None)]);
    write(&ws.root, "fine/LICENSE", "mit");

    let oracle = ws.oracle().with_license_text("fine/LICENSE", "MIT");
    let auditor = ws.auditor(oracle);
    let (report, models) = auditor.run_with_models(&ws.root).unwrap();

    assert_eq!(report.packages.len(), 2);
    let broken = report.packages.iter().find(|p| p.name == "broken").unwrap();
    assert_eq!(broken.status, Status::Failure);
    for o in &broken.outcomes {
        assert_eq!(o.status, Status::Failure);
        assert_eq!(
            o.reason,
            "PackageError: There must be at most one license tag without source-files."
        );
    }
    let fine = report.packages.iter().find(|p| p.name == "fine").unwrap();
    assert_eq!(fine.status, Status::Success);

    // The error is raised before any file set is resolved or scanned
    let model = models.iter().find(|m| m.name() == "broken").unwrap();
    assert!(model.declarations().is_err());
    assert_eq!(report.overall, Status::Failure);
}

#[test]
fn test_owned_files_partition_the_package() {
    let ws = Workspace::new();
    let pkg = write_package(
        &ws.root,
        "pkg",
        "pkg",
        &[
            license_tag("MIT", Some("LICENSE"), None),
            license_tag("BSD-3-Clause", Some("third_party/LICENSE.bsd"), Some("third_party/*")),
            license_tag("Zlib", Some("LICENSE.zlib"), Some("src/zlib_*.c include/*.h")),
        ],
    );
    for rel in [
        "LICENSE",
        "LICENSE.zlib",
        "src/main.c",
        "src/zlib_inflate.c",
        "include/zlib.h",
        "third_party/LICENSE.bsd",
        "third_party/lib.c",
    ] {
        write(&pkg, rel, "x");
    }

    let auditor = ws.auditor(ws.oracle());
    let (_, models) = auditor.run_with_models(&ws.root).unwrap();
    let decls = models[0].declarations().unwrap();

    let mut union = BTreeSet::new();
    let mut total = 0;
    for decl in decls {
        let owned = decl.owned_files.as_ref().unwrap();
        total += owned.len();
        union.extend(owned.iter().cloned());
    }
    assert_eq!(union.len(), total, "owned file sets overlap");
    assert_eq!(union, all_files(&pkg));

    let zlib = decls.get("Zlib").unwrap();
    assert!(zlib.owns("src/zlib_inflate.c"));
    assert!(zlib.owns("include/zlib.h"));
    assert!(decls.get("MIT").unwrap().owns("src/main.c"));
    assert!(decls.get("MIT").unwrap().owns("package.xml"));
}

#[test]
fn test_audit_is_idempotent() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "pkg", &[license_tag("BSD", None, None)]);
    write(&ws.root, "pkg/LICENSE", "bsd");
    write(&ws.root, "pkg/src/a.c", "bsd");

    let oracle = ws
        .oracle()
        .with_license_text("pkg/LICENSE", "BSD-3-Clause")
        .with_code("pkg/src/a.c", "BSD-3-Clause");
    let auditor = ws.auditor(oracle);
    let (first, models) = auditor.run_with_models(&ws.root).unwrap();
    let second = auditor.run(&ws.root).unwrap();

    let statuses = |r: &ros_license_audit::RunReport| {
        r.packages[0]
            .outcomes
            .iter()
            .map(|o| (o.check, o.status, o.reason.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(statuses(&first), statuses(&second));

    let model = &models[0];
    let a = model.declarations().unwrap();
    let b = model.declarations().unwrap();
    assert!(std::ptr::eq(a, b));
    assert!(std::ptr::eq(model.scan_results(), model.scan_results()));
}

#[test]
fn test_normalization_is_stable() {
    let vocab = LicenseVocabulary::builtin();
    for text in ["Apache License 2.0", "Apache-2.0", "MIT", "BSD", "Proprietary"] {
        let once = vocab.normalize(text);
        assert_eq!(vocab.normalize(once.as_str()), once);
    }
    assert_eq!(vocab.normalize("Apache License 2.0").as_str(), "Apache-2.0");
    assert_eq!(vocab.normalize("BSD").as_str(), "BSD");
}

#[test]
fn test_package_without_tags() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "pkg", &[]);
    write(&ws.root, "pkg/LICENSE", "mit");

    let oracle = ws.oracle().with_license_text("pkg/LICENSE", "MIT");
    let report = ws.auditor(oracle).run(&ws.root).unwrap();
    let pkg = &report.packages[0];

    assert_eq!(
        outcome(pkg, Check::TagExists),
        (Status::Failure, "No license tag defined.".to_string())
    );
    assert_eq!(outcome(pkg, Check::TagIsRecognized).0, Status::Success);
    assert_eq!(outcome(pkg, Check::LicenseTextExists).0, Status::Failure);
    assert_eq!(outcome(pkg, Check::LicensesInCode).0, Status::Failure);
    assert_eq!(outcome(pkg, Check::LicenseFilesReferenced).0, Status::Failure);
}

#[test]
fn test_repository_level_license_is_shared() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.root.join(".git")).unwrap();
    write(&ws.root, "LICENSE", "Apache License\n");
    write_package(&ws.root, "pkgs/a", "a", &[license_tag("Apache-2.0", None, None)]);
    write_package(&ws.root, "pkgs/b", "b", &[license_tag("Apache-2.0", None, None)]);
    write(&ws.root, "pkgs/a/src/a.cpp", "apache");
    write(&ws.root, "pkgs/b/src/b.cpp", "apache");

    let oracle = ws
        .oracle()
        .with_license_text("LICENSE", "Apache-2.0")
        .with_code("pkgs/a/src/a.cpp", "Apache-2.0")
        .with_code("pkgs/b/src/b.cpp", "Apache-2.0");
    let auditor = ws.auditor(oracle);
    let (report, models) = auditor.run_with_models(&ws.root).unwrap();

    assert_eq!(report.packages.len(), 2);
    for pkg in &report.packages {
        for o in &pkg.outcomes {
            assert_eq!(o.status, Status::Success, "{} {}: {}", pkg.name, o.check.name(), o.reason);
        }
    }
    for model in &models {
        let decl = model.declarations().unwrap().get("Apache-2.0").unwrap();
        assert_eq!(decl.text_file.as_deref(), Some("../../LICENSE"));
    }
    assert!(std::ptr::eq(
        models[0].repo().unwrap(),
        models[1].repo().unwrap()
    ));
}

#[test]
fn test_package_text_wins_over_repository_text() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.root.join(".git")).unwrap();
    write(&ws.root, "LICENSE", "Apache License\n");
    write_package(&ws.root, "pkg", "pkg", &[license_tag("MIT", None, None)]);
    write(&ws.root, "pkg/LICENSE", "MIT License\n");
    write(&ws.root, "pkg/src/main.c", "// mit");

    let oracle = ws
        .oracle()
        .with_license_text("LICENSE", "Apache-2.0")
        .with_license_text("pkg/LICENSE", "MIT")
        .with_code("pkg/src/main.c", "MIT");
    let auditor = ws.auditor(oracle);
    let (report, models) = auditor.run_with_models(&ws.root).unwrap();

    let decls = models[0].declarations().unwrap();
    let decl = decls.get("MIT").unwrap();
    assert_eq!(decl.text_file.as_deref(), Some("LICENSE"));
    assert!(models[0].license_text_files().contains_key("../LICENSE"));
    for o in &report.packages[0].outcomes {
        assert_eq!(o.status, Status::Success, "{}: {}", o.check.name(), o.reason);
    }
}

#[test]
fn test_source_files_outside_package_are_rejected() {
    let ws = Workspace::new();
    write_package(
        &ws.root,
        "pkg",
        "pkg",
        &[
            license_tag("MIT", Some("LICENSE"), None),
            license_tag("Zlib", Some("LICENSE"), Some("../shared/*")),
        ],
    );
    write(&ws.root, "pkg/LICENSE", "mit");
    write(&ws.root, "shared/x.c", "zlib");

    let auditor = ws.auditor(ws.oracle().with_license_text("pkg/LICENSE", "MIT"));
    let report = auditor.run(&ws.root).unwrap();

    let (status, reason) = outcome(&report.packages[0], Check::LicensesInCode);
    assert_eq!(status, Status::Failure);
    assert_eq!(
        reason,
        "PackageError: Invalid source-files glob: ../shared/*: escapes the package root"
    );
    assert_eq!(auditor.exit_policy().exit_code(&report), EX_DATAERR);
}

#[test]
fn test_reference_text_rescues_unclassified_license_file() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "pkg", &[license_tag("MIT", Some("LICENSE"), None)]);
    let body = "Permission is hereby granted, free of charge, to any person obtaining a copy";
    write(&ws.root, "pkg/LICENSE", &format!("{}\n", body));

    let oracle = ws.oracle().with_license_text("pkg/LICENSE", "");
    let report = ws.auditor(oracle.clone()).run(&ws.root).unwrap();
    assert_eq!(outcome(&report.packages[0], Check::LicenseTextExists).0, Status::Failure);

    let auditor = ws
        .auditor(oracle)
        .with_reference_texts(Box::new(InMemoryReferenceTexts::new().with("MIT", body)));
    let report = auditor.run(&ws.root).unwrap();
    let (status, reason) = outcome(&report.packages[0], Check::LicenseTextExists);
    assert_eq!(status, Status::Success, "{}", reason);
}

#[test]
fn test_no_packages_is_usage_error() {
    let ws = Workspace::new();
    write(&ws.root, "README.md", "nothing here");
    let auditor = ws.auditor(ws.oracle());
    let report = auditor.run(&ws.root).unwrap();
    assert!(report.is_empty());
    assert_eq!(auditor.exit_policy().exit_code(&report), EX_USAGE);
}

#[test]
fn test_copyright_file_for_single_package() {
    let ws = Workspace::new();
    write_package(&ws.root, "pkg", "my_pkg", &[license_tag("MIT", Some("LICENSE"), None)]);
    write(&ws.root, "pkg/LICENSE", "MIT License\n\nPermission is hereby granted.\n");
    write(&ws.root, "pkg/src/a.c", "x");

    let oracle = ws
        .oracle()
        .with_license_text("pkg/LICENSE", "MIT")
        .with_copyrights("pkg/src/a.c", &["Copyright (c) 2024 ACME Robotics"]);
    let (_, models) = ws.auditor(oracle).run_with_models(&ws.root).unwrap();

    let rendered = render_copyright_file(&models[0]).unwrap();
    assert!(rendered.contains("Upstream-Name: my_pkg\n"));
    assert!(rendered.contains("Files:\n *\nCopyright: 2024 ACME Robotics\nLicense: MIT\n"));
    assert!(rendered.ends_with(" MIT License\n\n Permission is hereby granted.\n"));
}
