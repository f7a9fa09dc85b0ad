pub mod form;
pub mod media;
pub mod models;
pub mod policy;
pub mod repository;
pub mod routes;
pub mod service;
pub mod upload;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use media::MediaStore;
use repository::BookRepository;
use routes::BooksState;
use service::BookService;

/// Books: uploads, the duplicate and textbook-edition rules, search.
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let media = MediaStore::new(&ctx.settings.media.root);
        media
            .prepare()
            .await
            .with_context(|| format!("failed to prepare media root {}", media.root().display()))?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            media_root = %media.root().display(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        let service = BookService::new(
            BookRepository::new(ctx.db.clone()),
            MediaStore::new(&ctx.settings.media.root),
        );
        routes::router(Arc::new(BooksState {
            service,
            pagination: ctx.settings.pagination,
        }))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let form_body = |required: Vec<&str>| {
            json!({
                "required": true,
                "content": {
                    "multipart/form-data": {
                        "schema": {
                            "allOf": [
                                { "$ref": "#/components/schemas/BookForm" },
                                { "required": required }
                            ]
                        }
                    }
                }
            })
        };
        let full_form = form_body(vec![
            "title", "author", "year", "genre", "category", "publisher", "book_file",
        ]);
        let book_response = json!({
            "description": "Book",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
            }
        });
        let write_errors = json!({
            "400": { "$ref": "#/components/responses/Invalid" },
            "403": { "$ref": "#/components/responses/Error" },
            "404": { "$ref": "#/components/responses/Error" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "description": "Search matches title, genre, category, publisher and author name.",
                        "tags": ["Books"],
                        "parameters": [
                            { "$ref": "#/components/parameters/Search" },
                            { "$ref": "#/components/parameters/Page" },
                            { "$ref": "#/components/parameters/PageSize" }
                        ],
                        "responses": {
                            "200": {
                                "description": "Page of books",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookPage" }
                                    }
                                }
                            },
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "post": {
                        "summary": "Create book",
                        "description": "Rejects duplicates of title, author, year and publisher, and a second textbook edition with the same year.",
                        "tags": ["Books"],
                        "security": [{ "token": [] }],
                        "requestBody": full_form,
                        "responses": {
                            "201": book_response,
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
                        "summary": "Retrieve book",
                        "tags": ["Books"],
                        "responses": {
                            "200": book_response,
                            "404": { "$ref": "#/components/responses/Error" }
                        }
                    },
                    "put": {
                        "summary": "Replace book",
                        "tags": ["Books"],
                        "security": [{ "token": [] }],
                        "requestBody": full_form,
                        "responses": {
                            "200": book_response,
                            "400": write_errors["400"],
                            "403": write_errors["403"],
                            "404": write_errors["404"]
                        }
                    },
                    "patch": {
                        "summary": "Update book fields",
                        "description": "Omitted fields keep their stored values; an empty `cover_image` part clears the cover.",
                        "tags": ["Books"],
                        "security": [{ "token": [] }],
                        "requestBody": form_body(vec![]),
                        "responses": {
                            "200": book_response,
                            "400": write_errors["400"],
                            "403": write_errors["403"],
                            "404": write_errors["404"]
                        }
                    },
                    "delete": {
                        "summary": "Delete book",
                        "tags": ["Books"],
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
                    "BookType": {
                        "type": "string",
                        "enum": ["fiction", "textbook"],
                        "default": "fiction"
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string", "maxLength": 100 },
                            "author": { "type": "integer" },
                            "author_name": { "type": "string" },
                            "year": { "type": "integer", "minimum": 1000, "maximum": 9999 },
                            "genre": { "type": "string", "maxLength": 100 },
                            "category": { "type": "string", "maxLength": 100 },
                            "publisher": { "type": "string", "maxLength": 100 },
                            "cover_image": { "type": ["string", "null"] },
                            "book_file": { "type": "string" },
                            "book_type": { "$ref": "#/components/schemas/BookType" }
                        },
                        "required": [
                            "id", "title", "author", "author_name", "year", "genre",
                            "category", "publisher", "cover_image", "book_file", "book_type"
                        ]
                    },
                    "BookForm": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": 100 },
                            "author": { "type": "integer" },
                            "year": { "type": "integer", "minimum": 1000, "maximum": 9999 },
                            "genre": { "type": "string", "maxLength": 100 },
                            "category": { "type": "string", "maxLength": 100 },
                            "publisher": { "type": "string", "maxLength": 100 },
                            "book_type": { "$ref": "#/components/schemas/BookType" },
                            "book_file": {
                                "type": "string",
                                "format": "binary",
                                "description": "PDF or EPUB, at most 50 MB"
                            },
                            "cover_image": {
                                "type": "string",
                                "format": "binary",
                                "description": "Any image type"
                            }
                        }
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "count": { "type": "integer" },
                            "page": { "type": "integer" },
                            "next": { "type": ["integer", "null"] },
                            "previous": { "type": ["integer", "null"] },
                            "results": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
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
                CREATE TABLE book (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    title       TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 100),
                    author_id   INTEGER NOT NULL REFERENCES author (id) ON DELETE CASCADE,
                    year        INTEGER NOT NULL CHECK (year > 0),
                    genre       TEXT NOT NULL CHECK (length(genre) BETWEEN 1 AND 100),
                    category    TEXT NOT NULL CHECK (length(category) BETWEEN 1 AND 100),
                    publisher   TEXT NOT NULL CHECK (length(publisher) BETWEEN 1 AND 100),
                    cover_image TEXT,
                    book_file   TEXT NOT NULL,
                    book_type   TEXT NOT NULL DEFAULT 'fiction'
                                CHECK (book_type IN ('fiction', 'textbook'))
                );
                CREATE UNIQUE INDEX book_natural_key
                    ON book (title, author_id, year, publisher);
                CREATE UNIQUE INDEX book_textbook_edition
                    ON book (title, author_id, publisher, year)
                    WHERE book_type = 'textbook';
                CREATE INDEX book_author ON book (author_id);
                "#,
        }]
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}
