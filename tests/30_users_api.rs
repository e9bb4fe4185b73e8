mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_group(client: &reqwest::Client, base_url: &str, name: &str) -> Result<i64> {
    let group = client
        .post(format!("{}/groups", base_url))
        .json(&json!({ "name": name }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    Ok(group["id"].as_i64().expect("group id"))
}

#[tokio::test]
async fn user_crud_round_trip() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let first_name = common::unique("Alice");

    let res = client
        .post(format!("{}/users", server.base_url))
        .json(&json!({
            "firstName": first_name,
            "lastName": "Ngo",
            "jobTitle": "Engineer"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let user = res.json::<Value>().await?;
    let id = user["id"].as_i64().expect("created user id");
    assert_eq!(user["firstName"], json!(first_name));
    assert!(user["groupId"].is_null());

    let res = client
        .get(format!("{}/users/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{}/users", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .json::<Value>()
        .await?
        .as_array()
        .expect("users array")
        .iter()
        .any(|u| u["id"].as_i64() == Some(id)));

    // Partial update changes only the provided field
    let res = client
        .put(format!("{}/users/{}", server.base_url, id))
        .json(&json!({ "jobTitle": "Staff Engineer" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["jobTitle"], json!("Staff Engineer"));
    assert_eq!(updated["firstName"], json!(first_name));

    let res = client
        .delete(format!("{}/users/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/users/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn user_create_requires_all_name_fields() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/users", server.base_url))
        .json(&json!({ "firstName": "Alice" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["error"],
        json!("Missing required fields: firstName, lastName, jobTitle")
    );

    Ok(())
}

#[tokio::test]
async fn user_move_assigns_group() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();

    let group_id = create_group(&client, &server.base_url, &common::unique("Eng")).await?;
    let user = client
        .post(format!("{}/users", server.base_url))
        .json(&json!({
            "firstName": common::unique("Bob"),
            "lastName": "Stone",
            "jobTitle": "Engineer"
        }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let user_id = user["id"].as_i64().expect("user id");

    let res = client
        .patch(format!(
            "{}/users/{}/groups/{}",
            server.base_url, user_id, group_id
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let moved = res.json::<Value>().await?;
    assert_eq!(moved["groupId"].as_i64(), Some(group_id));

    // The group now lists the user as a direct member
    let res = client
        .get(format!("{}/groups/{}/users", server.base_url, group_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .json::<Value>()
        .await?
        .as_array()
        .expect("users array")
        .iter()
        .any(|u| u["id"].as_i64() == Some(user_id)));

    // Moving into a missing group is a 404
    let res = client
        .patch(format!(
            "{}/users/{}/groups/999999999",
            server.base_url, user_id
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
