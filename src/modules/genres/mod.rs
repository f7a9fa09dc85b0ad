pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::GenreRepository;
use routes::GenresState;

/// Genres: a flat list of unique names used as descriptive metadata.
pub struct GenresModule;

impl GenresModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "genres module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(Arc::new(GenresState {
            repo: GenreRepository::new(ctx.db.clone()),
            pagination: ctx.settings.pagination,
        }))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let genre_body = json!({
            "required": true,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/GenreInput" } }
            }
        });
        let genre_response = json!({
            "description": "Genre",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Genre" } }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List genres",
                        "tags": ["Genres"],
                        "parameters": [
                            { "$ref": "#/components/parameters/Search" },
                            { "$ref": "#/components/parameters/Page" },
                            { "$ref": "#/components/parameters/PageSize" }
                        ],
                        "responses": {
                            "200": {
                                "description": "Page of genres",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/GenrePage" }
                                    }
                                }
                            },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "post": {
                        "summary": "Create genre",
                        "tags": ["Genres"],
                        "security": [{ "token": [] }],
                        "requestBody": genre_body,
                        "responses": {
                            "201": genre_response,
                            "400": { "$ref": "#/components/responses/Invalid" },
                            "403": { "$ref": "#/components/responses/Error" }
                        }
                    }
                },
                "/{id}/": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                    ],
                    "get": {
                        "summary": "Retrieve genre",
                        "tags": ["Genres"],
                        "responses": {
                            "200": genre_response,
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "put": {
                        "summary": "Rename genre",
                        "tags": ["Genres"],
                        "security": [{ "token": [] }],
                        "requestBody": genre_body,
                        "responses": {
                            "200": genre_response,
                            "400": { "$ref": "#/components/responses/Invalid" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "patch": {
                        "summary": "Rename genre",
                        "tags": ["Genres"],
                        "security": [{ "token": [] }],
                        "responses": {
                            "200": genre_response,
                            "400": { "$ref": "#/components/responses/Invalid" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "delete": {
                        "summary": "Delete genre",
                        "tags": ["Genres"],
                        "security": [{ "token": [] }],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Genre": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "name": { "type": "string", "maxLength": 100 }
                        },
                        "required": ["id", "name"]
                    },
                    "GenreInput": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "maxLength": 100 }
                        },
                        "required": ["name"]
                    },
                    "GenrePage": {
                        "type": "object",
                        "properties": {
                            "count": { "type": "integer" },
                            "page": { "type": "integer" },
                            "next": { "type": ["integer", "null"] },
                            "previous": { "type": ["integer", "null"] },
                            "results": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Genre" }
                            }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE genre (
                    id   INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100)
                );
                CREATE UNIQUE INDEX genre_name_unique ON genre (name);
                "#,
        }]
    }
}

/// Create a new instance of the genres module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(GenresModule::new())
}
