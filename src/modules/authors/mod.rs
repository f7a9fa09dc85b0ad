pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::AuthorRepository;
use routes::AuthorsState;

/// Authors: unique names, optional biography, cascade to books on delete.
pub struct AuthorsModule;

impl AuthorsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(Arc::new(AuthorsState {
            repo: AuthorRepository::new(ctx.db.clone()),
            pagination: ctx.settings.pagination,
        }))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List authors",
                        "tags": ["Authors"],
                        "parameters": [
                            { "$ref": "#/components/parameters/Search" },
                            { "$ref": "#/components/parameters/Page" },
                            { "$ref": "#/components/parameters/PageSize" }
                        ],
                        "responses": {
                            "200": {
                                "description": "Page of authors matching `search` on name or biography",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/AuthorPage" }
                                    }
                                }
                            },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "post": {
                        "summary": "Create author",
                        "tags": ["Authors"],
                        "security": [{ "token": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorInput" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Author" }
                                    }
                                }
                            },
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
                        "summary": "Retrieve author",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "Author",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Author" }
                                    }
                                }
                            },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "put": {
                        "summary": "Replace author",
                        "tags": ["Authors"],
                        "security": [{ "token": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorInput" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Updated" },
                            "400": { "$ref": "#/components/responses/Invalid" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "patch": {
                        "summary": "Update some author fields",
                        "tags": ["Authors"],
                        "security": [{ "token": [] }],
                        "responses": {
                            "200": { "description": "Updated" },
                            "400": { "$ref": "#/components/responses/Invalid" },
                            "403": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "delete": {
                        "summary": "Delete author and their books",
                        "tags": ["Authors"],
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
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "name": { "type": "string", "maxLength": 200 },
                            "biography": { "type": "string" },
                            "books": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "integer" },
                                        "title": { "type": "string" }
                                    }
                                }
                            }
                        },
                        "required": ["id", "name", "biography", "books"]
                    },
                    "AuthorInput": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "maxLength": 200 },
                            "biography": { "type": "string" }
                        },
                        "required": ["name"]
                    },
                    "AuthorPage": {
                        "type": "object",
                        "properties": {
                            "count": { "type": "integer" },
                            "page": { "type": "integer" },
                            "next": { "type": ["integer", "null"] },
                            "previous": { "type": ["integer", "null"] },
                            "results": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Author" }
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
                CREATE TABLE author (
                    id        INTEGER PRIMARY KEY AUTOINCREMENT,
                    name      TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 200),
                    biography TEXT NOT NULL DEFAULT ''
                );
                CREATE UNIQUE INDEX author_name_unique ON author (name);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

/// Create a new instance of the authors module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new())
}
