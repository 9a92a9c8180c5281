//! Uploads receipt images and turns them into links that display the image directly.

use crate::api::Storage;
use crate::clock;
use crate::model::{Attachment, Folio};
use crate::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, warn};
use url::Url;

/// The storage path of a receipt: one folder per client, one file per operation. The folio keeps
/// same-named receipts of one batch apart.
pub(crate) fn receipt_path(
    alias: &str,
    folio: Folio,
    filename: &str,
    now: &DateTime<Tz>,
) -> String {
    format!(
        "/{}/{}_{}_{}",
        alias.replace(' ', "_"),
        clock::upload_stamp(now),
        folio,
        filename
    )
}

/// Uploads the receipt of operation `folio` for the client `alias` and returns a direct link to
/// it. Any failure is logged and yields an empty link so that the operation can still be recorded.
pub(crate) async fn upload_receipt(
    storage: &mut dyn Storage,
    attachment: &Attachment,
    alias: &str,
    folio: Folio,
    now: &DateTime<Tz>,
) -> String {
    let path = receipt_path(alias, folio, attachment.filename(), now);
    match try_upload(storage, attachment, &path).await {
        Ok(link) => {
            debug!("Uploaded receipt to {path}");
            link
        }
        Err(e) => {
            warn!("Unable to upload the receipt '{}': {e:#}", attachment.filename());
            String::new()
        }
    }
}

async fn try_upload(storage: &mut dyn Storage, attachment: &Attachment, path: &str) -> Result<String> {
    storage.upload(path, attachment.content()).await?;
    let existing = storage.list_shared_links(path).await?;
    let link = match existing.into_iter().next() {
        Some(link) => link,
        None => storage.create_shared_link(path).await?,
    };
    Ok(normalize_link(&link))
}

/// Rewrites a shared link so that it serves the raw file: a `dl` query parameter becomes
/// `raw=1`, other parameters are kept, and `raw=1` is added when there is no `dl`. A link that
/// cannot be parsed is returned unchanged.
pub(crate) fn normalize_link(link: &str) -> String {
    let Ok(mut url) = Url::parse(link) else {
        return link.to_string();
    };
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut replaced = false;
    let mut rewritten = Vec::with_capacity(pairs.len() + 1);
    for (key, value) in pairs {
        match key.as_str() {
            "dl" if !replaced => {
                rewritten.push(("raw".to_string(), "1".to_string()));
                replaced = true;
            }
            "dl" | "raw" => {}
            _ => rewritten.push((key, value)),
        }
    }
    if !replaced {
        rewritten.push(("raw".to_string(), "1".to_string()));
    }
    url.query_pairs_mut().clear().extend_pairs(rewritten);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestStorage, TestStorageState};
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::America::Mexico_City;
    use uuid::Uuid;

    fn now() -> DateTime<Tz> {
        Mexico_City.with_ymd_and_hms(2025, 6, 1, 10, 11, 12).unwrap()
    }

    fn folio(number: u32) -> Folio {
        Folio::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), number)
    }

    #[test]
    fn test_receipt_path() {
        assert_eq!(
            receipt_path("Juan Perez", folio(3), "recibo.png", &now()),
            "/Juan_Perez/20250601_101112_25-06-01-0003_recibo.png"
        );
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(
            normalize_link("https://www.dropbox.com/s/abc/r.png?dl=0"),
            "https://www.dropbox.com/s/abc/r.png?raw=1"
        );
        assert_eq!(
            normalize_link("https://www.dropbox.com/scl/fi/abc/r.png?rlkey=x&dl=0"),
            "https://www.dropbox.com/scl/fi/abc/r.png?rlkey=x&raw=1"
        );
        assert_eq!(
            normalize_link("https://www.dropbox.com/s/abc/r.png"),
            "https://www.dropbox.com/s/abc/r.png?raw=1"
        );
        assert_eq!(normalize_link("not a url"), "not a url");
    }

    #[tokio::test]
    async fn test_upload_receipt() {
        let mut storage = TestStorage::new(Uuid::new_v4().to_string());
        let attachment = Attachment::new("recibo.png", vec![9, 9, 9]);
        let link = upload_receipt(&mut storage, &attachment, "Juan Perez", folio(1), &now()).await;
        assert!(link.ends_with("/Juan_Perez/20250601_101112_25-06-01-0001_recibo.png?rlkey=test&raw=1"));
        let state = storage.get_state();
        assert_eq!(
            state.files.get("/Juan_Perez/20250601_101112_25-06-01-0001_recibo.png"),
            Some(&vec![9, 9, 9])
        );
    }

    #[tokio::test]
    async fn test_second_upload_reuses_link() {
        let mut storage = TestStorage::new(Uuid::new_v4().to_string());
        let first = Attachment::new("recibo.png", vec![1]);
        let second = Attachment::new("recibo.png", vec![2]);
        let a = upload_receipt(&mut storage, &first, "Ana", folio(1), &now()).await;
        let b = upload_receipt(&mut storage, &second, "Ana", folio(1), &now()).await;
        assert!(!a.is_empty());
        assert_eq!(a, b);
        let state = storage.get_state();
        assert_eq!(state.create_link_calls, 1);
        assert_eq!(state.upload_calls, 2);
        assert_eq!(
            state.files.get("/Ana/20250601_101112_25-06-01-0001_recibo.png"),
            Some(&vec![2])
        );
    }

    #[tokio::test]
    async fn test_same_name_in_one_batch_keeps_both() {
        let mut storage = TestStorage::new(Uuid::new_v4().to_string());
        let first = Attachment::new("IMG.jpg", vec![1]);
        let second = Attachment::new("IMG.jpg", vec![2]);
        let a = upload_receipt(&mut storage, &first, "Ana", folio(1), &now()).await;
        let b = upload_receipt(&mut storage, &second, "Ana", folio(2), &now()).await;
        assert_ne!(a, b);
        let state = storage.get_state();
        assert_eq!(state.files.len(), 2);
        assert_eq!(
            state.files.get("/Ana/20250601_101112_25-06-01-0001_IMG.jpg"),
            Some(&vec![1])
        );
        assert_eq!(
            state.files.get("/Ana/20250601_101112_25-06-01-0002_IMG.jpg"),
            Some(&vec![2])
        );
    }

    #[tokio::test]
    async fn test_failed_upload_is_empty_link() {
        let mut storage = TestStorage::new(Uuid::new_v4().to_string());
        storage.set_state(TestStorageState {
            fail_uploads: true,
            ..Default::default()
        });
        let attachment = Attachment::new("recibo.png", vec![1]);
        assert_eq!(upload_receipt(&mut storage, &attachment, "Ana", folio(1), &now()).await, "");
    }

    #[tokio::test]
    async fn test_failed_link_is_empty_link() {
        let mut storage = TestStorage::new(Uuid::new_v4().to_string());
        storage.set_state(TestStorageState {
            fail_links: true,
            ..Default::default()
        });
        let attachment = Attachment::new("recibo.png", vec![1]);
        assert_eq!(upload_receipt(&mut storage, &attachment, "Ana", folio(1), &now()).await, "");
    }
}
