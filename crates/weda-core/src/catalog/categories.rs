//! Product category endpoints.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{PageQuery, PageResponse};
use crate::api::{ApiClient, ApiResult};

/// A product category as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
    #[serde(default)]
    pub category_description: Option<String>,
}

/// Fields the client supplies when creating or updating a category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub category_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_description: Option<String>,
}

/// Update payload: the draft plus the id it applies to.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryUpdate<'a> {
    category_id: i64,
    #[serde(flatten)]
    draft: &'a CategoryDraft,
}

/// Client for the `/reference/category` endpoints.
#[derive(Clone)]
pub struct CategoriesClient {
    api: Arc<ApiClient>,
}

impl CategoriesClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Lists one page of categories.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn list(&self, query: &PageQuery) -> ApiResult<PageResponse<Category>> {
        self.api.get_json_query("/reference/category", query).await
    }

    /// Fetches a single category by id.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn get(&self, category_id: i64) -> ApiResult<Category> {
        self.api
            .get_json(&format!("/reference/category/{category_id}"))
            .await
    }

    /// Creates a category and returns the server's copy.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn create(&self, draft: &CategoryDraft) -> ApiResult<Category> {
        self.api.post_json("/reference/category", draft).await
    }

    /// Updates a category and returns the server's copy.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or an
    /// unexpected response shape.
    pub async fn update(&self, category_id: i64, draft: &CategoryDraft) -> ApiResult<Category> {
        let body = CategoryUpdate { category_id, draft };
        self.api
            .put_json(&format!("/reference/category/{category_id}"), &body)
            .await
    }

    /// Deletes a category.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-2xx status.
    pub async fn delete(&self, category_id: i64) -> ApiResult<()> {
        self.api
            .delete(&format!("/reference/category/{category_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> CategoriesClient {
        let api = Arc::new(ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap());
        CategoriesClient::new(api)
    }

    /// Test: list uses the category sort key and unwraps the envelope.
    #[tokio::test]
    async fn test_list_categories() {
        let server = MockServer::start().await;
        let categories = client_for(&server);

        Mock::given(method("GET"))
            .and(path("/reference/category"))
            .and(query_param("sort", "categoryId"))
            .and(query_param("direction", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    {"categoryId": 1, "categoryName": "Oils"},
                    {"categoryId": 2, "categoryName": "Powders", "categoryDescription": "Churnas"},
                ],
            })))
            .mount(&server)
            .await;

        let page = categories
            .list(&PageQuery::sorted_by("categoryId"))
            .await
            .unwrap();

        assert_eq!(page.result.len(), 2);
        assert_eq!(page.result[0].category_name, "Oils");
        assert_eq!(page.result[0].category_description, None);
        assert_eq!(page.result[1].category_description.as_deref(), Some("Churnas"));
    }

    /// Test: create posts the draft as camelCase JSON.
    #[tokio::test]
    async fn test_create_category() {
        let server = MockServer::start().await;
        let categories = client_for(&server);

        Mock::given(method("POST"))
            .and(path("/reference/category"))
            .and(body_json(json!({"categoryName": "Teas"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "categoryId": 9,
                "categoryName": "Teas",
            })))
            .mount(&server)
            .await;

        let draft = CategoryDraft {
            category_name: "Teas".to_string(),
            category_description: None,
        };
        let created = categories.create(&draft).await.unwrap();
        assert_eq!(created.category_id, 9);
    }

    /// Test: update includes the category id alongside the draft fields.
    #[tokio::test]
    async fn test_update_includes_id_in_body() {
        let server = MockServer::start().await;
        let categories = client_for(&server);

        Mock::given(method("PUT"))
            .and(path("/reference/category/9"))
            .and(body_json(json!({
                "categoryId": 9,
                "categoryName": "Herbal teas",
                "categoryDescription": "Kashayas and infusions",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "categoryId": 9,
                "categoryName": "Herbal teas",
                "categoryDescription": "Kashayas and infusions",
            })))
            .mount(&server)
            .await;

        let draft = CategoryDraft {
            category_name: "Herbal teas".to_string(),
            category_description: Some("Kashayas and infusions".to_string()),
        };
        let updated = categories.update(9, &draft).await.unwrap();
        assert_eq!(updated.category_description.as_deref(), Some("Kashayas and infusions"));
    }

    /// Test: delete issues a DELETE on the item path.
    #[tokio::test]
    async fn test_delete_category() {
        let server = MockServer::start().await;
        let categories = client_for(&server);

        Mock::given(method("DELETE"))
            .and(path("/reference/category/9"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        categories.delete(9).await.unwrap();
    }
}
