use serde::Serialize;
use serde_json::Value;

const BASE_URL: &str = "http://127.0.0.1:3000";
const MEDIA_ITEM_ID: &str = "demo-item";
const ORIGIN: &str = "203.0.113.10";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    media_item_id: String,
    text: String,
    name: Option<String>,
    parent_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    println!("Starting mediadex test client...");

    println!("\n[1/5] Posting a comment and a reply...");
    let post_url = format!("{}/api/comments", BASE_URL);
    let root: Value = client
        .post(&post_url)
        .json(&CreateCommentRequest {
            media_item_id: MEDIA_ITEM_ID.to_string(),
            text: "Finished it last night, the ending holds up.".to_string(),
            name: Some("Ferris".to_string()),
            parent_id: None,
        })
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let root_id = root["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing id in response: {}", root))?
        .to_string();
    println!("   -> Created {}", root_id);

    client
        .post(&post_url)
        .json(&CreateCommentRequest {
            media_item_id: MEDIA_ITEM_ID.to_string(),
            text: "Agreed!".to_string(),
            name: None,
            parent_id: Some(root_id.clone()),
        })
        .send()
        .await?
        .error_for_status()?;

    println!("\n[2/5] Liking the comment twice from the same origin...");
    let like_url = format!("{}/api/comments/{}/like", BASE_URL, root_id);
    for attempt in 1..=2 {
        let resp = client
            .post(&like_url)
            .header("x-forwarded-for", ORIGIN)
            .send()
            .await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        println!("   -> attempt {}: {} {}", attempt, status, body);
    }

    println!("\n[3/5] Unliking...");
    let resp = client
        .delete(&like_url)
        .header("x-forwarded-for", ORIGIN)
        .send()
        .await?;
    println!("   -> {} {}", resp.status(), resp.text().await?);

    println!("\n[4/5] Fetching the thread view...");
    let tree_url = format!("{}/api/comments/tree?mediaItemId={}", BASE_URL, MEDIA_ITEM_ID);
    let threads: Vec<Value> = client.get(&tree_url).send().await?.json().await?;
    for t in &threads {
        println!(
            "      - {}: {} ({} replies, {} hidden)",
            t["name"].as_str().unwrap_or(domain::ANONYMOUS_NAME),
            t["text"],
            t["replies"].as_array().map(Vec::len).unwrap_or(0),
            t["hiddenReplies"]
        );
    }

    println!("\n[5/5] Counting comments...");
    let count_url = format!(
        "{}/api/comments/count?mediaItemIds={},unknown-item",
        BASE_URL, MEDIA_ITEM_ID
    );
    let counts: Value = client.get(&count_url).send().await?.json().await?;
    println!("   -> {}", counts);

    Ok(())
}
