use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::memory::objects::{FileMap, ObjectDb};
use crate::oid::Oid;

pub(crate) const HEADS: &str = "refs/heads/";
pub(crate) const REMOTES: &str = "refs/remotes/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Head {
    Branch(String),
    Detached(Oid),
}

/// State of one repository: objects, refs, HEAD, index, and config.
#[derive(Debug)]
pub(crate) struct Repo {
    pub objects: ObjectDb,
    pub refs: BTreeMap<String, Oid>,
    pub head: Head,
    pub index: FileMap,
    pub config: BTreeMap<String, Vec<String>>,
}

impl Repo {
    pub fn new(default_branch: &str) -> Self {
        Self {
            objects: ObjectDb::default(),
            refs: BTreeMap::new(),
            head: Head::Branch(default_branch.to_string()),
            index: FileMap::new(),
            config: BTreeMap::new(),
        }
    }

    pub fn current_branch(&self) -> Option<&str> {
        match &self.head {
            Head::Branch(name) => Some(name),
            Head::Detached(_) => None,
        }
    }

    /// Commit HEAD points at; `None` on an unborn branch.
    pub fn head_commit(&self) -> Option<Oid> {
        match &self.head {
            Head::Branch(name) => self.refs.get(&format!("{HEADS}{name}")).copied(),
            Head::Detached(oid) => Some(*oid),
        }
    }

    pub fn head_files(&self) -> EngineResult<FileMap> {
        self.objects.commit_files(self.head_commit())
    }

    /// Move HEAD (or the branch it names) to `oid`.
    pub fn advance_head(&mut self, oid: Oid) {
        match &self.head {
            Head::Branch(name) => {
                self.refs.insert(format!("{HEADS}{name}"), oid);
            }
            Head::Detached(_) => self.head = Head::Detached(oid),
        }
    }

    pub fn resolve(&self, reference: &str) -> EngineResult<Oid> {
        if reference == "HEAD" {
            return self
                .head_commit()
                .ok_or_else(|| EngineError::NotFound("HEAD".into()));
        }
        let candidates = [
            reference.to_string(),
            format!("refs/{reference}"),
            format!("refs/tags/{reference}"),
            format!("{HEADS}{reference}"),
            format!("{REMOTES}{reference}"),
        ];
        if let Some(oid) = candidates.iter().find_map(|name| self.refs.get(name)) {
            return Ok(*oid);
        }
        if let Ok(oid) = reference.parse::<Oid>() {
            if self.objects.commit(&oid).is_ok() {
                return Ok(oid);
            }
        }
        Err(EngineError::NotFound(format!("ref {reference}")))
    }

    pub fn config_last(&self, key: &str) -> Option<String> {
        self.config.get(key).and_then(|values| values.last().cloned())
    }

    pub fn remote_url(&self, remote: &str) -> Option<String> {
        self.config_last(&format!("remote.{remote}.url"))
    }

    /// Short names of refs under `prefix`.
    pub fn short_refs(&self, prefix: &str) -> Vec<String> {
        self.refs
            .keys()
            .filter_map(|name| name.strip_prefix(prefix))
            .filter(|short| *short != "HEAD")
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_short_and_full_names() {
        let mut repo = Repo::new("main");
        let oid = crate::oid::ObjectHasher::COMMIT.hash(b"c");
        repo.refs.insert("refs/heads/main".into(), oid);
        repo.refs.insert("refs/remotes/origin/dev".into(), oid);

        assert_eq!(repo.resolve("HEAD").unwrap(), oid);
        assert_eq!(repo.resolve("main").unwrap(), oid);
        assert_eq!(repo.resolve("refs/heads/main").unwrap(), oid);
        assert_eq!(repo.resolve("origin/dev").unwrap(), oid);
        assert!(matches!(repo.resolve("nope"), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn unborn_head_does_not_resolve() {
        let repo = Repo::new("main");
        assert_eq!(repo.head_commit(), None);
        assert!(repo.resolve("HEAD").is_err());
        assert!(repo.head_files().unwrap().is_empty());
    }

    #[test]
    fn short_refs_strip_prefix_and_skip_head() {
        let mut repo = Repo::new("main");
        let oid = crate::oid::ObjectHasher::COMMIT.hash(b"c");
        repo.refs.insert("refs/remotes/origin/HEAD".into(), oid);
        repo.refs.insert("refs/remotes/origin/main".into(), oid);
        repo.refs.insert("refs/heads/main".into(), oid);
        assert_eq!(repo.short_refs("refs/remotes/origin/"), vec!["main"]);
        assert_eq!(repo.short_refs(HEADS), vec!["main"]);
    }
}
