use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseEvent};
use futures::future::BoxFuture;

use crate::error::{Result, RoveError};
use crate::git::Repository;
use crate::types::{Commit, CommitDiff, RefEntry, Reference, TreeEntry, TAG_PREFIX};
use crate::ui::repo::{BRANCHES_TAB, FILES_TAB, LOG_TAB, README_TAB, TAGS_TAB};
use crate::ui::selector::ItemRef;
use crate::ui::spinner::SpinnerId;

/// Pane specific payloads, delivered to exactly one pane.
#[derive(Debug, Clone)]
pub enum Content {
    Readme { content: String, path: String },
    FileItems { path: String, entries: Vec<TreeEntry> },
    FileContent { path: String, content: String },
    LogCount(usize),
    /// One page of commits, starting `skip` commits from the tip.
    LogItems { skip: usize, commits: Vec<Commit> },
    LogDiff(Box<CommitDiff>),
    RefItems { prefix: String, refs: Vec<RefEntry> },
}

impl Content {
    /// Tab name of the pane this payload belongs to.
    pub fn target(&self) -> &'static str {
        match self {
            Content::Readme { .. } => README_TAB,
            Content::FileItems { .. } | Content::FileContent { .. } => FILES_TAB,
            Content::LogCount(_) | Content::LogItems { .. } | Content::LogDiff(_) => LOG_TAB,
            Content::RefItems { prefix, .. } => {
                if prefix == TAG_PREFIX {
                    TAGS_TAB
                } else {
                    BRANCHES_TAB
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    // Session
    Repo(Arc<dyn Repository>),
    Ref(Reference),
    EmptyRepo,

    // Tabs
    SelectTab(usize),
    ActiveTab(usize),
    SwitchTab(String),

    // Terminal input
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },

    Content(Content),
    SpinnerTick(SpinnerId),

    // Selection lists
    ItemSelected(Option<ItemRef>),
    ItemActive(Option<ItemRef>),

    UpdateStatusBar,
    Copy { text: String, message: String },
    ToggleFooter,
    Back,
    Quit,

    Error(String),
    None,
}

impl From<RoveError> for Message {
    fn from(err: RoveError) -> Self {
        Message::Error(err.to_string())
    }
}

/// A deferred computation that yields exactly one message back into the loop.
pub struct Task(BoxFuture<'static, Message>);

impl Task {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Message> + Send + 'static,
    {
        Task(Box::pin(fut))
    }

    pub fn ready(msg: Message) -> Self {
        Task::new(futures::future::ready(msg))
    }

    /// Run a fallible collaborator call, mapping failure to `Message::Error`.
    pub fn attempt<F, T, M>(fut: F, on_ok: M) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
        M: FnOnce(T) -> Message + Send + 'static,
    {
        Task::new(async move {
            match fut.await {
                Ok(value) => on_ok(value),
                Err(e) => {
                    tracing::warn!("task failed: {}", e);
                    e.into()
                }
            }
        })
    }

    pub async fn resolve(self) -> Message {
        self.0.await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// Resolve every task, in order. Test helper for inspecting what an update asked for.
#[cfg(test)]
pub async fn resolve_all(tasks: Vec<Task>) -> Vec<Message> {
    futures::future::join_all(tasks.into_iter().map(Task::resolve)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BRANCH_PREFIX;

    #[test]
    fn content_targets_match_tab_names() {
        let readme = Content::Readme {
            content: String::new(),
            path: String::new(),
        };
        assert_eq!(readme.target(), "Readme");
        assert_eq!(Content::LogCount(3).target(), "Commits");
        assert_eq!(
            Content::FileContent {
                path: "a".into(),
                content: "b".into()
            }
            .target(),
            "Files"
        );
    }

    #[test]
    fn ref_items_target_follows_prefix() {
        let branches = Content::RefItems {
            prefix: BRANCH_PREFIX.to_string(),
            refs: vec![],
        };
        let tags = Content::RefItems {
            prefix: TAG_PREFIX.to_string(),
            refs: vec![],
        };
        assert_eq!(branches.target(), "Branches");
        assert_eq!(tags.target(), "Tags");
    }

    #[tokio::test]
    async fn ready_task_yields_its_message() {
        let msg = Task::ready(Message::SwitchTab("Files".into())).resolve().await;
        assert!(matches!(msg, Message::SwitchTab(name) if name == "Files"));
    }

    #[tokio::test]
    async fn failed_attempt_becomes_error_message() {
        let task = Task::attempt(
            async { Err::<(), _>(RoveError::Config("boom".into())) },
            |_| Message::None,
        );
        match task.resolve().await {
            Message::Error(e) => assert!(e.contains("boom")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn resolve_all_keeps_order() {
        let msgs = resolve_all(vec![
            Task::ready(Message::SelectTab(1)),
            Task::ready(Message::UpdateStatusBar),
        ])
        .await;
        assert!(matches!(msgs[0], Message::SelectTab(1)));
        assert!(matches!(msgs[1], Message::UpdateStatusBar));
    }
}
