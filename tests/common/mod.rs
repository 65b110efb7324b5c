//! Scratch GitOps repository shared by the integration tests.
//!
//! Layout on `main`:
//!
//! ```text
//! argo-cd-apps/overlays/{staging,production}/kustomization.yaml
//! components/foo/base/{kustomization,deploy}.yaml
//! components/foo/{staging,production}/kustomization.yaml
//! components/old/production/kustomization.yaml
//! ```
//!
//! `feature` (checked out) changes `foo/staging`, deletes
//! `old/production` and adds an untracked `new/staging`.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

/// Build command standing in for kustomize: prints the kustomization file.
pub const CAT_COMMAND: [&str; 3] = ["sh", "-c", "cat \"$0/kustomization.yaml\""];

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Create the repository in `root` and leave `feature` checked out.
pub fn feature_repo(root: &Path) {
    git(root, &["init", "-b", "main"]);
    git(root, &["config", "user.email", "test@test.com"]);
    git(root, &["config", "user.name", "Test"]);
    git(root, &["config", "commit.gpgsign", "false"]);

    write(
        root,
        ".render-diff.toml",
        &format!(
            "[build]\ncommand = [{}]\n",
            CAT_COMMAND
                .iter()
                .map(|w| format!("{w:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );
    write(root, "argo-cd-apps/overlays/staging/kustomization.yaml", "resources: []\n");
    write(root, "argo-cd-apps/overlays/production/kustomization.yaml", "resources: []\n");
    write(root, "components/foo/base/kustomization.yaml", "resources:\n- deploy.yaml\n");
    write(root, "components/foo/base/deploy.yaml", "kind: Deployment\n");
    write(
        root,
        "components/foo/staging/kustomization.yaml",
        "resources:\n- ../base\nnamePrefix: v1-\n",
    );
    write(
        root,
        "components/foo/production/kustomization.yaml",
        "resources:\n- ../base\n",
    );
    write(
        root,
        "components/old/production/kustomization.yaml",
        "resources: []\nnamespace: old\n",
    );
    git(root, &["add", "-A"]);
    git(root, &["commit", "-m", "initial"]);

    git(root, &["checkout", "-b", "feature"]);
    write(
        root,
        "components/foo/staging/kustomization.yaml",
        "resources:\n- ../base\nnamePrefix: v2-\n",
    );
    git(root, &["rm", "-r", "-q", "components/old"]);
    git(root, &["add", "-A"]);
    git(root, &["commit", "-m", "feature work"]);

    write(
        root,
        "components/new/staging/kustomization.yaml",
        "resources: []\nnamespace: new\n",
    );
}
