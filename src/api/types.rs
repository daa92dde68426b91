//! Wire types for the news-aggregation API.
//!
//! Field names follow the backend's JSON (Spanish column names). Every
//! optional field carries `#[serde(default)]` so a payload with missing
//! optional data deserializes instead of failing the whole response;
//! only structurally required keys (e.g. `categories`, `points`) produce
//! a malformed-response error.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Time Filter
// ============================================================================

/// Coarse recency window constraining which articles are included.
///
/// Serialized on the wire as `"24h"` / `"48h"` / `"72h"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    H24,
    H48,
    #[default]
    H72,
}

impl TimeFilter {
    /// Query-parameter representation (`24h`, `48h`, `72h`).
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::H24 => "24h",
            TimeFilter::H48 => "48h",
            TimeFilter::H72 => "72h",
        }
    }

    pub fn hours(self) -> u32 {
        match self {
            TimeFilter::H24 => 24,
            TimeFilter::H48 => 48,
            TimeFilter::H72 => 72,
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" | "24" => Ok(TimeFilter::H24),
            "48h" | "48" => Ok(TimeFilter::H48),
            "72h" | "72" => Ok(TimeFilter::H72),
            other => Err(format!(
                "invalid time filter '{}' (expected 24h, 48h, or 72h)",
                other
            )),
        }
    }
}

// ============================================================================
// Category Tree (/api/articles)
// ============================================================================

/// Top-level payload of `/api/articles`.
///
/// `categories` is intentionally *not* defaulted: a response without the
/// key is malformed, not empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryTree {
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryNode {
    pub categoria_id: i64,
    pub nombre: String,
    /// Absent in some backend revisions; derived from nested counts then.
    #[serde(default)]
    pub article_count: Option<u64>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubcategoryNode {
    /// Some backend revisions omit the id inside the tree payload.
    #[serde(default, alias = "id")]
    pub subcategoria_id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub article_count: Option<u64>,
    #[serde(default)]
    pub events: Vec<EventNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventNode {
    pub evento_id: i64,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Date string as sent by the backend; parsed leniently for sorting.
    #[serde(default)]
    pub fecha_evento: Option<String>,
    #[serde(default)]
    pub article_count: Option<u64>,
    #[serde(default)]
    pub articles: Vec<ArticleRef>,
}

/// Compact article reference inside an event strip.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleRef {
    #[serde(alias = "articulo_id")]
    pub id: i64,
    pub titular: String,
    #[serde(default, alias = "periodico")]
    pub periodico_nombre: Option<String>,
    #[serde(default)]
    pub fecha_publicacion: Option<String>,
    #[serde(default)]
    pub paywall: bool,
}

// ============================================================================
// Subcategories (/api/subcategories)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subcategory {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub article_count: u64,
}

// ============================================================================
// Article Detail (/api/article/{id})
// ============================================================================

/// Full article payload shown in the detail modal.
///
/// Immutable snapshot from the API; everything beyond `id` and `titular`
/// is optional and rendered with a placeholder when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleDetail {
    #[serde(alias = "articulo_id")]
    pub id: i64,
    pub titular: String,
    #[serde(default)]
    pub subtitular: Option<String>,
    #[serde(default)]
    pub periodico_nombre: Option<String>,
    #[serde(default)]
    pub periodico_logo: Option<String>,
    #[serde(default)]
    pub fecha_publicacion: Option<String>,
    #[serde(default)]
    pub periodista: Option<String>,
    #[serde(default)]
    pub agencia: Option<String>,
    #[serde(default)]
    pub gpt_resumen: Option<String>,
    #[serde(default)]
    pub gpt_opinion: Option<String>,
    /// Comma-joined keyword list; split client-side into badges.
    #[serde(default)]
    pub gpt_palabras_clave: Option<String>,
    #[serde(default)]
    pub gpt_cantidad_fuentes_citadas: Option<i64>,
    #[serde(default)]
    pub paywall: bool,
    #[serde(default)]
    pub url: Option<String>,
}

// ============================================================================
// Similarity Map (/api/mapa-data)
// ============================================================================

/// `/api/mapa-data` answers either with map data or with a business-level
/// "no articles" object. The failure arm is listed first so untagged
/// deserialization prefers it when `error` is present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MapResponse {
    Failure {
        error: String,
        #[serde(default)]
        message: Option<String>,
    },
    Data(MapData),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapData {
    pub points: Vec<MapPoint>,
    #[serde(default)]
    pub clusters: Vec<MapCluster>,
}

/// One article projected into the 2-D similarity space.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapPoint {
    pub id: i64,
    pub titular: String,
    #[serde(default)]
    pub periodico: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub subcategoria: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub resumen: Option<String>,
    /// `[x, y]` pair.
    pub coordinates: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapCluster {
    pub center: (f64, f64),
    pub keyword: String,
}

// ============================================================================
// Posturas (/api/posturas)
// ============================================================================

/// An event with its stance groupings (two opposing opinion clusters).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PosturaEvent {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub categoria_nombre: Option<String>,
    #[serde(default)]
    pub subcategoria_nombre: Option<String>,
    #[serde(default)]
    pub posturas: Vec<Postura>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Postura {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub opinion_conjunto_1: Option<String>,
    #[serde(default)]
    pub opinion_conjunto_2: Option<String>,
    #[serde(default)]
    pub articulos_ids_conjunto_1: Vec<i64>,
    #[serde(default)]
    pub articulos_ids_conjunto_2: Vec<i64>,
}

// ============================================================================
// Update Notifications (/api/article-updates)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleUpdate {
    pub titular: String,
    #[serde(default)]
    pub updated_on: Option<String>,
}
