//! School and student queries over a document collection.

use std::cmp::Ordering;

use serde_json::{json, Value};
use tracing::info;

use crate::documents::collection::{into_document, Document, DocumentCollection};
use crate::error::Result;

/// Every document in the collection; empty when there are none.
pub async fn list_all(collection: &dyn DocumentCollection) -> Result<Vec<Document>> {
    collection.find(&Document::new()).await
}

/// Inserts a school built from `fields` (a JSON object) and returns its `_id`.
pub async fn insert_school(collection: &dyn DocumentCollection, fields: Value) -> Result<Value> {
    collection.insert_one(into_document(fields)?).await
}

/// Replaces the `topics` of every school named `name`.
pub async fn update_topics(
    collection: &dyn DocumentCollection,
    name: &str,
    topics: &[&str],
) -> Result<()> {
    let filter = into_document(json!({ "name": name }))?;
    let set = into_document(json!({ "topics": topics }))?;
    let modified = collection.update_many(&filter, &set).await?;
    info!("Updated topics of {} school(s) named {}", modified, name);
    Ok(())
}

/// Schools whose `topics` include `topic`.
pub async fn schools_by_topic(
    collection: &dyn DocumentCollection,
    topic: &str,
) -> Result<Vec<Document>> {
    let filter = into_document(json!({ "topics": topic }))?;
    collection.find(&filter).await
}

/// Students projected to `_id`, `name` and `averageScore`, best average first.
///
/// `averageScore` is the mean of `scores[].score`; students without numeric
/// scores get `null` and sort last.
pub async fn top_students(collection: &dyn DocumentCollection) -> Result<Vec<Document>> {
    let mut ranked: Vec<(Option<f64>, Document)> = list_all(collection)
        .await?
        .into_iter()
        .map(|student| {
            let average = average_score(&student);
            let mut projected = Document::new();
            if let Some(id) = student.get("_id") {
                projected.insert("_id".to_string(), id.clone());
            }
            if let Some(name) = student.get("name") {
                projected.insert("name".to_string(), name.clone());
            }
            projected.insert("averageScore".to_string(), json!(average));
            (average, projected)
        })
        .collect();

    // Stable sort keeps insertion order among equal averages
    ranked.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(ranked.into_iter().map(|(_, doc)| doc).collect())
}

fn average_score(student: &Document) -> Option<f64> {
    let scores: Vec<f64> = student
        .get("scores")?
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("score").and_then(Value::as_f64))
        .collect();

    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
