use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use perms_fieldset::{apply, FieldSetError};
use perms_store::{DocumentStore, StoreError};
use perms_types::{DocumentId, Selection};
use perms_xml::{parse, serialize, Formatting, XmlError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{UpdateError, UpdateResult};
use crate::provider::SelectionProvider;
use crate::report::{BatchReport, DocumentOutcome};

/// Whether updated documents are written back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateMode {
    #[default]
    Write,
    /// Compute every rewrite and its preview, write nothing.
    DryRun,
}

/// Applies one selection across many permission sets.
pub struct BatchUpdater {
    store: Arc<dyn DocumentStore>,
    provider: Box<dyn SelectionProvider>,
    mode: UpdateMode,
}

impl BatchUpdater {
    pub fn new(store: Arc<dyn DocumentStore>, provider: Box<dyn SelectionProvider>) -> Self {
        Self {
            store,
            provider,
            mode: UpdateMode::Write,
        }
    }

    pub fn with_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Ask the provider for a selection, then update every selected document.
    ///
    /// An invalid selection is returned as an error before any document is
    /// read.
    pub async fn run(&self) -> UpdateResult<BatchReport> {
        let selection = self.provider.select()?;
        Ok(self.update(selection).await)
    }

    /// Update every document in `selection`, one task per document.
    ///
    /// Every document is attempted; failures are collected, and documents
    /// already written are not rolled back.
    pub async fn update(&self, selection: Selection) -> BatchReport {
        let selection = Arc::new(selection);
        let targets = selection.target_documents().to_vec();
        info!(
            object = selection.target_object(),
            fields = selection.field_levels().len(),
            documents = targets.len(),
            mode = ?self.mode,
            "updating permission sets"
        );

        let mut tasks = JoinSet::new();
        let mut owners = HashMap::new();
        for id in targets.iter().cloned() {
            let store = Arc::clone(&self.store);
            let selection = Arc::clone(&selection);
            let mode = self.mode;
            let owner = id.clone();
            let handle = tasks.spawn(async move {
                update_document(store.as_ref(), &id, &selection, mode).await
            });
            owners.insert(handle.id(), owner);
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (task, result) = match joined {
                Ok((task, result)) => (task, result),
                Err(e) => (e.id(), Err(UpdateError::TaskFailed(e.to_string()))),
            };
            if let Some(id) = owners.remove(&task) {
                results.insert(id, result);
            }
        }

        let mut report = BatchReport::default();
        for id in targets {
            let result = results
                .remove(&id)
                .unwrap_or_else(|| Err(UpdateError::TaskFailed("task did not report".to_string())));
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err) => {
                    warn!(document = %id, error = %err, "permission set not updated");
                    report.failures.push((id, err));
                }
            }
        }
        info!(
            updated = report.outcomes.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        report
    }
}

/// Read, update and (in [`UpdateMode::Write`]) write back one document.
///
/// Nothing is written unless every step before the write succeeds.
pub async fn update_document(
    store: &dyn DocumentStore,
    id: &DocumentId,
    selection: &Selection,
    mode: UpdateMode,
) -> UpdateResult<DocumentOutcome> {
    let original = store.read(id).await.map_err(|err| match err {
        StoreError::NotFound(_) => UpdateError::DocumentNotFound(id.clone()),
        StoreError::InvalidUtf8 { valid_up_to, .. } => UpdateError::MalformedDocument {
            id: id.clone(),
            source: FieldSetError::Xml(XmlError::Malformed {
                position: valid_up_to,
                reason: "invalid UTF-8".to_string(),
            }),
        },
        source => UpdateError::ReadFailure {
            id: id.clone(),
            source,
        },
    })?;
    let formatting = Formatting::sniff(&original);
    let malformed = |source: FieldSetError| UpdateError::MalformedDocument {
        id: id.clone(),
        source,
    };

    let mut doc = parse(&original).map_err(|e| malformed(e.into()))?;
    let summary = apply(&mut doc, selection.target_object(), selection.field_levels())
        .map_err(malformed)?;
    let rewritten = serialize(&doc, &formatting);
    debug!(
        document = %id,
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        "applied field permissions"
    );

    match mode {
        UpdateMode::Write => {
            store
                .write(id, &rewritten)
                .await
                .map_err(|source| UpdateError::WriteFailure {
                    id: id.clone(),
                    source,
                })?;
            Ok(DocumentOutcome {
                id: id.clone(),
                summary,
                written: true,
                preview: None,
            })
        }
        UpdateMode::DryRun => Ok(DocumentOutcome {
            id: id.clone(),
            summary,
            written: false,
            preview: Some(perms_diff::preview(id, &original, &rewritten)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticSelection;
    use perms_fieldset::FieldSet;
    use perms_store::{FsDocumentStore, InMemoryDocumentStore};
    use perms_types::{AccessLevel, RawSelection};
    use perms_xml::Value;

    const FIRST: &str = "FirstPermissionSet.permissionset-meta.xml";
    const SECOND: &str = "SecondPermissionSet.permissionset-meta.xml";

    const EMPTY_SET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PermissionSet xmlns="http://soap.sforce.com/2006/04/metadata">
    <description>First</description>
    <hasActivationRequired>false</hasActivationRequired>
    <label>First Permission Set</label>
</PermissionSet>
"#;

    const NAME_AND_ZIP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PermissionSet xmlns="http://soap.sforce.com/2006/04/metadata">
  <fieldPermissions>
    <editable>true</editable>
    <field>Account.Address__c</field>
    <readable>true</readable>
  </fieldPermissions>
  <fieldPermissions>
    <editable>false</editable>
    <field>Account.Name</field>
    <readable>true</readable>
  </fieldPermissions>
  <fieldPermissions>
    <editable>false</editable>
    <field>Account.Zip__c</field>
    <readable>true</readable>
  </fieldPermissions>
  <label>Second</label>
</PermissionSet>
"#;

    fn id(name: &str) -> DocumentId {
        DocumentId::new(name).unwrap()
    }

    fn selection(fields: &[(&str, AccessLevel)], docs: &[&str]) -> Selection {
        Selection::new(
            "Account",
            fields.iter().map(|(f, l)| (f.to_string(), *l)).collect(),
            docs.iter().map(|d| id(d)).collect(),
        )
        .unwrap()
    }

    fn entries(text: &str) -> Vec<(String, bool, bool)> {
        let doc = parse(text).unwrap();
        let root = doc.root().and_then(Value::as_mapping).unwrap();
        FieldSet::load(root)
            .unwrap()
            .entries()
            .map(|e| (e.field.clone(), e.readable, e.editable))
            .collect()
    }

    fn updater(store: Arc<InMemoryDocumentStore>, selection: Selection) -> BatchUpdater {
        BatchUpdater::new(store, Box::new(StaticSelection(selection)))
    }

    #[tokio::test]
    async fn scenario_empty_collection_gets_two_sorted_entries() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(FIRST), EMPTY_SET)]));
        let sel = selection(
            &[
                ("Address__c", AccessLevel::Read),
                ("AddressString__c", AccessLevel::ReadEdit),
            ],
            &[FIRST],
        );
        let report = updater(store.clone(), sel).run().await.unwrap();
        assert!(report.is_success());

        let written = store.get(&id(FIRST)).unwrap();
        assert_eq!(
            entries(&written),
            vec![
                ("Account.AddressString__c".to_string(), true, true),
                ("Account.Address__c".to_string(), true, false),
            ]
        );
        assert!(written.contains("\n    <fieldPermissions>\n        <editable>"));
    }

    #[tokio::test]
    async fn scenario_relevel_updates_in_place() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(SECOND), NAME_AND_ZIP)]));
        let sel = selection(&[("Address__c", AccessLevel::Read)], &[SECOND]);
        let report = updater(store.clone(), sel).run().await.unwrap();

        let outcome = report.outcome(&id(SECOND)).unwrap();
        assert_eq!(outcome.summary.updated, 1);
        assert_eq!(outcome.summary.total, 3);
        let after = entries(&store.get(&id(SECOND)).unwrap());
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], ("Account.Address__c".to_string(), true, false));
    }

    #[tokio::test]
    async fn scenario_insert_between_neighbours() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(SECOND), NAME_AND_ZIP)]));
        let sel = selection(&[("Phone__c", AccessLevel::Read)], &[SECOND]);
        updater(store.clone(), sel).run().await.unwrap();

        let fields: Vec<String> = entries(&store.get(&id(SECOND)).unwrap())
            .into_iter()
            .map(|(f, _, _)| f)
            .collect();
        assert_eq!(
            fields,
            vec![
                "Account.Address__c",
                "Account.Name",
                "Account.Phone__c",
                "Account.Zip__c"
            ]
        );
    }

    #[tokio::test]
    async fn scenario_invalid_level_rejected_before_any_write() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([
            (id(FIRST), EMPTY_SET),
            (id(SECOND), NAME_AND_ZIP),
        ]));
        let raw = RawSelection {
            target_documents: vec![FIRST.into(), SECOND.into()],
            target_object: "Account".into(),
            field_levels: [
                ("Name".to_string(), "read".to_string()),
                ("Zip__c".to_string(), "archived".to_string()),
            ]
            .into(),
        };
        let updater = BatchUpdater::new(store.clone(), Box::new(raw));
        let err = updater.run().await.unwrap_err();
        assert!(matches!(err, UpdateError::InvalidAccessLevel(ref l) if l == "archived"));
        assert!(store.writes().is_empty());
        assert_eq!(store.get(&id(FIRST)).as_deref(), Some(EMPTY_SET));
    }

    #[tokio::test]
    async fn malformed_document_does_not_affect_siblings() {
        let broken = id("Broken.permissionset-meta.xml");
        let store = Arc::new(InMemoryDocumentStore::with_documents([
            (id(FIRST), EMPTY_SET.to_string()),
            (broken.clone(), "<PermissionSet><label>x</PermissionSet>".to_string()),
        ]));
        let sel = selection(
            &[("Name", AccessLevel::Read)],
            &[FIRST, broken.as_str()],
        );
        let report = updater(store.clone(), sel).run().await.unwrap();

        assert!(!report.is_success());
        assert!(matches!(
            report.failure(&broken),
            Some(UpdateError::MalformedDocument { .. })
        ));
        assert_eq!(
            store.get(&broken).as_deref(),
            Some("<PermissionSet><label>x</PermissionSet>")
        );
        assert_eq!(store.writes(), vec![id(FIRST)]);
        assert_eq!(entries(&store.get(&id(FIRST)).unwrap()).len(), 1);

        let summary = report.result();
        assert!(!summary.success);
        assert!(summary.error_message.unwrap().contains("Broken"));
    }

    #[tokio::test]
    async fn wrong_root_is_malformed() {
        let profile = id("Admin.profile-meta.xml");
        let store = Arc::new(InMemoryDocumentStore::with_documents([(
            profile.clone(),
            "<Profile><custom>false</custom></Profile>",
        )]));
        let sel = selection(&[("Name", AccessLevel::Read)], &[profile.as_str()]);
        let report = updater(store, sel).run().await.unwrap();
        assert!(matches!(
            report.failure(&profile),
            Some(UpdateError::MalformedDocument {
                source: FieldSetError::UnexpectedRoot(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn non_utf8_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = id("Latin1.permissionset-meta.xml");
        std::fs::write(dir.path().join(FIRST), EMPTY_SET).unwrap();
        std::fs::write(dir.path().join(latin1.as_str()), b"<PermissionSet>\xff</PermissionSet>").unwrap();
        let store = Arc::new(FsDocumentStore::new(dir.path()));
        let sel = selection(&[("Name", AccessLevel::Read)], &[FIRST, latin1.as_str()]);
        let report = BatchUpdater::new(store, Box::new(StaticSelection(sel)))
            .run()
            .await
            .unwrap();

        assert!(matches!(
            report.failure(&latin1),
            Some(UpdateError::MalformedDocument {
                source: FieldSetError::Xml(XmlError::Malformed { position: 15, .. }),
                ..
            })
        ));
        assert!(report.outcome(&id(FIRST)).unwrap().written);
        assert_eq!(
            std::fs::read(dir.path().join(latin1.as_str())).unwrap(),
            b"<PermissionSet>\xff</PermissionSet>"
        );
    }

    /// Panics on reads of the listed documents, delegates everything else.
    struct PanickingStore {
        inner: InMemoryDocumentStore,
        panics_on: Vec<DocumentId>,
    }

    #[async_trait::async_trait]
    impl DocumentStore for PanickingStore {
        async fn read(&self, id: &DocumentId) -> perms_store::StoreResult<String> {
            if self.panics_on.contains(id) {
                panic!("read of {id} blew up");
            }
            self.inner.read(id).await
        }

        async fn write(&self, id: &DocumentId, text: &str) -> perms_store::StoreResult<()> {
            self.inner.write(id, text).await
        }

        async fn exists(&self, id: &DocumentId) -> perms_store::StoreResult<bool> {
            self.inner.exists(id).await
        }

        async fn list(&self) -> perms_store::StoreResult<Vec<DocumentId>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn panicking_tasks_are_charged_to_their_own_document() {
        let third = id("ThirdPermissionSet.permissionset-meta.xml");
        let store = Arc::new(PanickingStore {
            inner: InMemoryDocumentStore::with_documents([(id(FIRST), EMPTY_SET)]),
            panics_on: vec![id(SECOND), third.clone()],
        });
        let sel = selection(&[("Name", AccessLevel::Read)], &[FIRST, SECOND, third.as_str()]);
        let report = BatchUpdater::new(store, Box::new(StaticSelection(sel)))
            .run()
            .await
            .unwrap();

        assert!(report.outcome(&id(FIRST)).is_some());
        for doc in [id(SECOND), third] {
            match report.failure(&doc) {
                Some(UpdateError::TaskFailed(message)) => assert!(message.contains("panic")),
                other => panic!("unexpected result for {doc}: {other:?}"),
            }
        }
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn missing_document_reported() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(FIRST), EMPTY_SET)]));
        let sel = selection(&[("Name", AccessLevel::Read)], &[FIRST, SECOND]);
        let report = updater(store.clone(), sel).run().await.unwrap();
        assert!(matches!(
            report.failure(&id(SECOND)),
            Some(UpdateError::DocumentNotFound(_))
        ));
        assert!(report.outcome(&id(FIRST)).is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn write_failure_reported() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([
            (id(FIRST), EMPTY_SET),
            (id(SECOND), NAME_AND_ZIP),
        ]));
        store.fail_writes_to(id(SECOND));
        let sel = selection(&[("Name", AccessLevel::ReadEdit)], &[FIRST, SECOND]);
        let report = updater(store.clone(), sel).run().await.unwrap();

        assert!(matches!(
            report.failure(&id(SECOND)),
            Some(UpdateError::WriteFailure { .. })
        ));
        assert_eq!(store.get(&id(SECOND)).as_deref(), Some(NAME_AND_ZIP));
        assert_eq!(store.writes(), vec![id(FIRST)]);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing_and_previews() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(FIRST), EMPTY_SET)]));
        let sel = selection(&[("Name", AccessLevel::Read)], &[FIRST]);
        let report = updater(store.clone(), sel)
            .with_mode(UpdateMode::DryRun)
            .run()
            .await
            .unwrap();

        assert!(store.writes().is_empty());
        let outcome = report.outcome(&id(FIRST)).unwrap();
        assert!(!outcome.written);
        let preview = outcome.preview.as_ref().unwrap();
        assert_eq!(preview.additions, 5);
        assert_eq!(preview.deletions, 0);
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(SECOND), NAME_AND_ZIP)]));
        let sel = selection(&[("Name", AccessLevel::Read)], &[SECOND]);
        let report = updater(store.clone(), sel).run().await.unwrap();
        assert!(!report.outcome(&id(SECOND)).unwrap().summary.changed());
        assert_eq!(store.get(&id(SECOND)).as_deref(), Some(NAME_AND_ZIP));
    }

    #[tokio::test]
    async fn tabs_and_crlf_are_kept() {
        let text = "<PermissionSet>\r\n\t<label>Tabs</label>\r\n</PermissionSet>\r\n";
        let store = Arc::new(InMemoryDocumentStore::with_documents([(id(FIRST), text)]));
        let sel = selection(&[("Name", AccessLevel::Read)], &[FIRST]);
        updater(store.clone(), sel).run().await.unwrap();
        let written = store.get(&id(FIRST)).unwrap();
        assert!(written.contains("\r\n\t<fieldPermissions>\r\n\t\t<editable>false</editable>\r\n"));
        assert!(written.ends_with("</PermissionSet>\r\n"));
    }

    #[tokio::test]
    async fn updates_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FIRST), EMPTY_SET).unwrap();
        let store = Arc::new(FsDocumentStore::new(dir.path()));
        let sel = selection(
            &[
                ("Address__c", AccessLevel::Read),
                ("AddressString__c", AccessLevel::ReadEdit),
            ],
            &[FIRST],
        );
        let report = BatchUpdater::new(store, Box::new(StaticSelection(sel)))
            .run()
            .await
            .unwrap();
        assert!(report.result().success);

        let written = std::fs::read_to_string(dir.path().join(FIRST)).unwrap();
        assert_eq!(entries(&written).len(), 2);
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(written.contains("    <description>First</description>\n    <fieldPermissions>"));
    }
}
