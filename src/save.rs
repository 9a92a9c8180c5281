//! Records a session: one ledger entry per pending operation, then the client's new balance.

use crate::api::{Desk, Storage};
use crate::backup::{Backup, SAVE};
use crate::model::{batch_folios, Folio, LedgerEntry, OpType};
use crate::session::{Operation, Session};
use crate::writer::write_ledger;
use crate::{clock, uploader, Result};
use anyhow::Context;
use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

/// The result of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SaveOutcome {
    /// The session had no operations and nothing was written anywhere.
    NothingToSave,
    Saved {
        folios: Vec<Folio>,
        entries: Vec<LedgerEntry>,
        balance_updated: bool,
        warnings: Vec<String>,
    },
}

impl SaveOutcome {
    pub fn message(&self) -> String {
        match self {
            SaveOutcome::NothingToSave => "There are no operations to save".to_string(),
            SaveOutcome::Saved {
                entries,
                balance_updated: true,
                ..
            } => format!(
                "Saved {} and updated the client balance",
                count_operations(entries.len())
            ),
            SaveOutcome::Saved { entries, .. } => {
                format!("Saved {}", count_operations(entries.len()))
            }
        }
    }
}

/// `1 operation`, `3 operations`.
pub(crate) fn count_operations(n: usize) -> String {
    if n == 1 {
        "1 operation".to_string()
    } else {
        format!("{n} operations")
    }
}

/// What is written to the local journal before the ledger is touched.
#[derive(Debug, Serialize)]
struct Journal<'a> {
    client: &'a str,
    timestamp: &'a str,
    balance_final_usdt: Decimal,
    balance_final_mxn: Decimal,
    entries: &'a [LedgerEntry],
}

/// The collaborators a save writes to.
pub(crate) struct SaveContext<'a> {
    pub(crate) desk: &'a mut Desk,
    pub(crate) storage: &'a mut dyn Storage,
    pub(crate) backup: &'a Backup,
    pub(crate) compute_mxn: bool,
}

/// Saves every pending operation of `session` at time `now`.
///
/// Receipts are uploaded one at a time as their entries are built; a failed upload leaves the
/// entry without a link. All entries are then appended in one call, followed by the balance
/// write. Nothing is retried or rolled back.
///
/// # Errors
/// - Returns an error if no client is selected or the ledger append fails.
pub(crate) async fn save(
    session: &Session,
    ctx: SaveContext<'_>,
    now: &DateTime<Tz>,
) -> Result<SaveOutcome> {
    let client = session
        .client()
        .context("Select a client before saving")?;
    let alias = client.alias();

    let operations = session.pending_operations();
    if operations.is_empty() {
        info!("Nothing to save for '{alias}'");
        return Ok(SaveOutcome::NothingToSave);
    }

    let timestamp = clock::ledger_timestamp(now);
    let today = clock::folio_date(now);
    let base = ctx.desk.next_folio_number(today).await;
    let folios = batch_folios(today, base, operations.len());
    debug!("Saving {} operations starting at folio {base}", operations.len());

    let mut entries = Vec::with_capacity(operations.len());
    for (op, folio) in operations.iter().zip(folios.iter()) {
        info!("Processing operation {folio}");
        let link = match session.receipt(*op) {
            Some(attachment) => {
                uploader::upload_receipt(ctx.storage, attachment, alias, *folio, now).await
            }
            None => String::new(),
        };
        entries.push(build_entry(session, *op, *folio, &timestamp, alias)?.with_receipt_link(link));
    }

    let totals = session.totals(ctx.compute_mxn);
    let mut warnings = Vec::new();
    let journal = Journal {
        client: alias,
        timestamp: &timestamp,
        balance_final_usdt: totals.balance_final_usdt,
        balance_final_mxn: totals.balance_final_mxn,
        entries: &entries,
    };
    match ctx.backup.save_json(SAVE, &journal).await {
        Ok(path) => debug!("Journaled the batch to {}", path.display()),
        Err(e) => {
            warn!("Unable to journal the batch: {e:#}");
            warnings.push(format!("The local journal could not be written: {e}"));
        }
    }

    let outcome = write_ledger(
        ctx.desk,
        &entries,
        alias,
        totals.balance_final_usdt,
        totals.balance_final_mxn,
    )
    .await?;
    warnings.extend(outcome.warning);

    Ok(SaveOutcome::Saved {
        folios,
        entries,
        balance_updated: outcome.balance_updated,
        warnings,
    })
}

/// The ledger entry for one operation of the session.
fn build_entry(
    session: &Session,
    op: Operation,
    folio: Folio,
    timestamp: &str,
    alias: &str,
) -> Result<LedgerEntry> {
    let rates = session.rates();
    let entry = match op.op_type {
        OpType::Compra | OpType::Venta => {
            let rows = session.rows();
            let row = rows
                .get(op.index)
                .with_context(|| format!("Row {} does not exist", op.index))?;
            if op.op_type == OpType::Compra {
                LedgerEntry::conversion(
                    folio,
                    timestamp,
                    alias,
                    op.op_type,
                    row.pesos_pagar,
                    row.usdt_recibir,
                    rates.buy_rate(),
                )
            } else {
                LedgerEntry::conversion(
                    folio,
                    timestamp,
                    alias,
                    op.op_type,
                    row.pesos_cobrar,
                    row.usdt_entregar,
                    rates.sell_rate(),
                )
            }
        }
        OpType::Pago | OpType::Recibo => {
            let adjustments = session.adjustments();
            let adjustment = adjustments
                .get(op.index)
                .with_context(|| format!("Adjustment {} does not exist", op.index))?;
            let (amount, currency) = if op.op_type == OpType::Pago {
                (adjustment.pago_monto, adjustment.pago_moneda)
            } else {
                (adjustment.recibo_monto, adjustment.recibo_moneda)
            };
            LedgerEntry::adjustment(folio, timestamp, alias, op.op_type, amount, currency)
        }
    };
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestSheet, TestSheetState, TestStorage, TestStorageState, CLIENTES};
    use crate::model::{Attachment, Clients, Currency, RateConfig};
    use crate::test::TestEnv;
    use chrono::TimeZone;
    use chrono_tz::America::Mexico_City;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn now() -> DateTime<Tz> {
        Mexico_City.with_ymd_and_hms(2025, 6, 1, 10, 11, 12).unwrap()
    }

    struct Fixture {
        env: TestEnv,
        desk: Desk,
        storage: TestStorage,
        clients: Clients,
    }

    impl Fixture {
        async fn new() -> Self {
            let env = TestEnv::new().await;
            let mut desk = Desk::new(
                Box::new(TestSheet::new(env.config().spreadsheet_id())),
                env.config().ledger_tab(),
            );
            let clients = desk.clients().await;
            let storage = TestStorage::new(env.config().spreadsheet_id());
            Self {
                env,
                desk,
                storage,
                clients,
            }
        }

        fn session(&self, alias: &str) -> Session {
            let mut session = Session::new(RateConfig::new(d("18.55"), d("19.44")));
            session.select_client(&self.clients, alias).unwrap();
            session
        }

        async fn save(&mut self, session: &Session) -> Result<SaveOutcome> {
            let backup = self.env.config().backup();
            let ctx = SaveContext {
                desk: &mut self.desk,
                storage: &mut self.storage,
                backup: &backup,
                compute_mxn: false,
            };
            save(session, ctx, &now()).await
        }

        fn ledger(&self) -> Vec<Vec<String>> {
            self.env
                .get_state()
                .tab(self.env.config().ledger_tab())
                .cloned()
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_requires_client() {
        let mut fixture = Fixture::new().await;
        let session = Session::new(RateConfig::default());
        let err = fixture.save(&session).await.unwrap_err();
        assert!(err.to_string().contains("Select a client"));
    }

    #[tokio::test]
    async fn test_nothing_to_save_writes_nothing() {
        let mut fixture = Fixture::new().await;
        let session = fixture.session("Ana");
        let before = fixture.env.get_state();
        let outcome = fixture.save(&session).await.unwrap();
        assert_eq!(outcome, SaveOutcome::NothingToSave);
        assert_eq!(fixture.env.get_state(), before);
        assert_eq!(fixture.env.get_state().append_calls, 0);
        assert_eq!(fixture.env.get_state().write_calls, 0);
        assert_eq!(fixture.env.get_storage_state().upload_calls, 0);
    }

    #[tokio::test]
    async fn test_save_batch() {
        let mut fixture = Fixture::new().await;
        let mut session = fixture.session("Juan Perez");
        session.set_row_amounts(0, d("927.50"), Decimal::ZERO).unwrap();
        session
            .attach_vende(0, Attachment::new("recibo.png", vec![7]))
            .unwrap();
        let row = session.add_row().unwrap();
        session.set_row_amounts(row, Decimal::ZERO, d("388.80")).unwrap();
        session
            .set_adjustment(0, (Decimal::ZERO, Currency::Usdt), (d("10"), Currency::Usdt))
            .unwrap();

        let outcome = fixture.save(&session).await.unwrap();
        let SaveOutcome::Saved {
            folios,
            entries,
            balance_updated,
            warnings,
        } = &outcome
        else {
            panic!("expected a save");
        };
        assert!(*balance_updated);
        assert!(warnings.is_empty());
        let names: Vec<String> = folios.iter().map(|f| f.to_string()).collect();
        assert_eq!(names, vec!["25-06-01-0001", "25-06-01-0002", "25-06-01-0003"]);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            outcome.message(),
            "Saved 3 operations and updated the client balance"
        );

        let ledger = fixture.ledger();
        assert_eq!(ledger.len(), 4);
        assert_eq!(
            ledger[1][..7].to_vec(),
            vec!["25-06-01-0001", "2025-06-01 10:11:12", "Juan Perez", "Compra", "927.5", "50", "18.55"]
        );
        assert!(ledger[1][7]
            .ends_with("/Juan_Perez/20250601_101112_25-06-01-0001_recibo.png?rlkey=test&raw=1"));
        assert_eq!(
            ledger[2][3..].to_vec(),
            vec!["Venta", "388.8", "20", "19.44", ""]
        );
        assert_eq!(ledger[3][3..].to_vec(), vec!["Recibo", "", "10", "N/A", ""]);

        // 150 opening + 50 received - 20 delivered - 10 net adjustment
        let roster = fixture.env.get_state().tab(CLIENTES).cloned().unwrap();
        assert_eq!(roster[1][2], "170");
        assert_eq!(roster[1][3], "0");

        let journals = std::fs::read_dir(fixture.env.config().backups()).unwrap().count();
        assert_eq!(journals, 1);
    }

    #[tokio::test]
    async fn test_same_named_receipts_get_their_own_links() {
        let mut fixture = Fixture::new().await;
        let mut session = fixture.session("Ana");
        session.set_row_amounts(0, d("100"), Decimal::ZERO).unwrap();
        session
            .attach_vende(0, Attachment::new("IMG.jpg", vec![1]))
            .unwrap();
        let row = session.add_row().unwrap();
        session.set_row_amounts(row, d("200"), Decimal::ZERO).unwrap();
        session
            .attach_vende(row, Attachment::new("IMG.jpg", vec![2]))
            .unwrap();

        let outcome = fixture.save(&session).await.unwrap();
        let SaveOutcome::Saved { entries, .. } = outcome else {
            panic!("expected a save");
        };
        assert_ne!(entries[0].receipt_link, entries[1].receipt_link);

        let files = fixture.env.get_storage_state().files;
        assert_eq!(files.len(), 2);
        assert_eq!(
            files.get("/Ana/20250601_101112_25-06-01-0001_IMG.jpg"),
            Some(&vec![1])
        );
        assert_eq!(
            files.get("/Ana/20250601_101112_25-06-01-0002_IMG.jpg"),
            Some(&vec![2])
        );
    }

    #[test]
    fn test_message_counts_operations() {
        assert_eq!(count_operations(1), "1 operation");
        assert_eq!(count_operations(2), "2 operations");
        assert_eq!(
            SaveOutcome::NothingToSave.message(),
            "There are no operations to save"
        );
    }

    #[tokio::test]
    async fn test_folios_continue_the_day() {
        let mut fixture = Fixture::new().await;
        let mut session = fixture.session("Ana");
        session
            .set_adjustment(0, (d("5"), Currency::Mxn), (Decimal::ZERO, Currency::Usdt))
            .unwrap();
        fixture.save(&session).await.unwrap();
        let outcome = fixture.save(&session).await.unwrap();
        let SaveOutcome::Saved { folios, .. } = outcome else {
            panic!("expected a save");
        };
        assert_eq!(folios[0].to_string(), "25-06-01-0002");
    }

    #[tokio::test]
    async fn test_append_failure_is_error() {
        let mut fixture = Fixture::new().await;
        fixture.env.set_state(TestSheetState {
            fail_append: true,
            ..fixture.env.get_state()
        });
        let mut session = fixture.session("Ana");
        session.set_row_amounts(0, d("100"), Decimal::ZERO).unwrap();
        assert!(fixture.save(&session).await.is_err());
        assert_eq!(fixture.env.get_state().write_calls, 0);
    }

    #[tokio::test]
    async fn test_balance_failure_is_warning() {
        let mut fixture = Fixture::new().await;
        fixture.env.set_state(TestSheetState {
            fail_writes: true,
            ..fixture.env.get_state()
        });
        let mut session = fixture.session("Ana");
        session.set_row_amounts(0, d("100"), Decimal::ZERO).unwrap();
        let outcome = fixture.save(&session).await.unwrap();
        assert_eq!(outcome.message(), "Saved 1 operation");
        let SaveOutcome::Saved {
            balance_updated,
            warnings,
            ..
        } = outcome
        else {
            panic!("expected a save");
        };
        assert!(!balance_updated);
        assert_eq!(warnings.len(), 1);
        assert_eq!(fixture.ledger().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_link_empty() {
        let mut fixture = Fixture::new().await;
        fixture.env.set_storage_state(TestStorageState {
            fail_uploads: true,
            ..Default::default()
        });
        let mut session = fixture.session("Ana");
        session.set_row_amounts(0, d("100"), Decimal::ZERO).unwrap();
        session
            .attach_vende(0, Attachment::new("recibo.jpg", vec![1]))
            .unwrap();
        fixture.save(&session).await.unwrap();
        let ledger = fixture.ledger();
        assert_eq!(ledger[1][3], "Compra");
        assert_eq!(ledger[1][7], "");
    }
}
