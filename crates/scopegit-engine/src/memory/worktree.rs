//! Working-copy access through the filesystem adapter.

use std::collections::BTreeMap;

use bytes::Bytes;
use scopegit_fs::{FsClient, MkdirOptions, ReadOptions, WriteOptions};
use scopegit_path::normalize;

use crate::error::EngineResult;
use crate::hooks::TransferHooks;
use crate::memory::objects::{FileMap, ObjectDb};
use crate::types::Progress;

pub(crate) const GIT_DIR: &str = ".git";

pub(crate) fn absolute(dir: &str, rel: &str) -> String {
    normalize(&format!("{dir}/{rel}"))
}

/// Every file at or beneath `start` (relative to `dir`), keyed by relative
/// path. `.git` directories are skipped.
pub(crate) async fn scan(
    fs: &dyn FsClient,
    dir: &str,
    start: &str,
) -> EngineResult<BTreeMap<String, Bytes>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![start.to_string()];
    while let Some(rel) = pending.pop() {
        for name in fs.readdir(&absolute(dir, &rel)).await? {
            if name == GIT_DIR {
                continue;
            }
            let child = if rel.is_empty() {
                name
            } else {
                format!("{rel}/{name}")
            };
            let path = absolute(dir, &child);
            if fs.stat(&path).await?.is_directory() {
                pending.push(child);
            } else {
                let data = fs.read_file(&path, ReadOptions::default()).await?;
                files.insert(child, data.into_bytes());
            }
        }
    }
    Ok(files)
}

/// Working-copy changes that turn one snapshot into another.
#[derive(Debug, Default)]
pub(crate) struct WorktreePlan {
    pub writes: Vec<(String, Bytes)>,
    pub deletes: Vec<String>,
}

impl WorktreePlan {
    pub fn between(objects: &ObjectDb, from: &FileMap, to: &FileMap) -> EngineResult<Self> {
        let mut plan = Self::default();
        for (path, oid) in to {
            if from.get(path) != Some(oid) {
                plan.writes.push((path.clone(), objects.blob(oid)?));
            }
        }
        plan.deletes = from
            .keys()
            .filter(|path| !to.contains_key(*path))
            .cloned()
            .collect();
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.writes.len() + self.deletes.len()
    }

    pub async fn apply(
        self,
        fs: &dyn FsClient,
        dir: &str,
        hooks: &dyn TransferHooks,
    ) -> EngineResult<()> {
        let total = self.len() as u64;
        let mut loaded = 0;
        for path in &self.deletes {
            fs.unlink(&absolute(dir, path)).await?;
            loaded += 1;
            report(hooks, loaded, total);
        }
        for (path, data) in self.writes {
            ensure_parents(fs, dir, &path).await?;
            fs.write_file(&absolute(dir, &path), data.into(), WriteOptions::default())
                .await?;
            loaded += 1;
            report(hooks, loaded, total);
        }
        Ok(())
    }
}

fn report(hooks: &dyn TransferHooks, loaded: u64, total: u64) {
    hooks.on_progress(&Progress {
        phase: "Updating workdir".into(),
        loaded,
        total,
    });
}

async fn ensure_parents(fs: &dyn FsClient, dir: &str, rel: &str) -> EngineResult<()> {
    let Some((parents, _)) = rel.rsplit_once('/') else {
        return Ok(());
    };
    let mut current = String::new();
    for segment in parents.split('/') {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        let path = absolute(dir, &current);
        if !fs.exists(&path).await? {
            fs.mkdir(&path, MkdirOptions::default()).await?;
        }
    }
    Ok(())
}
