//! Export and image-fill URL derivation.
//!
//! Archives store rendered exports next to a `meta.json` that lists, per node,
//! which renditions exist (`"@2x.png"`, ...). Image fills are stored under
//! their content hash with a `meta.json` mapping image refs to file names.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendition format of an exported node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jpg,
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported export format '{0}', expected one of jpg, png, svg, pdf")]
pub struct ParseFormatError(pub String);

impl FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" => Ok(ExportFormat::Jpg),
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ParseFormatError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileImageParams {
    /// Node ids to render.
    pub ids: Vec<String>,
    /// Scaling factor between 0.01 and 4; 1 when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Rendition format; png when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,
}

impl FileImageParams {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Contents of `exports/meta.json`: node id to available rendition suffixes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportMeta {
    #[serde(default)]
    pub map: BTreeMap<String, Vec<String>>,
}

/// Contents of `images/meta.json`: image ref to stored file name.
///
/// Older archives nest the table one level deeper, as
/// `{"meta": {"images": {...}}}`; both layouts decode to the same value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FillMetaRepr")]
pub struct FillMeta {
    pub images: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FillMetaRepr {
    Flat { images: BTreeMap<String, String> },
    Nested { meta: Box<FillMetaRepr> },
}

impl From<FillMetaRepr> for FillMeta {
    fn from(repr: FillMetaRepr) -> Self {
        match repr {
            FillMetaRepr::Flat { images } => FillMeta { images },
            FillMetaRepr::Nested { meta } => FillMeta::from(*meta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileImageResponse {
    pub err: Option<String>,
    /// One entry per requested id. `None` when no matching rendition exists.
    pub images: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFillsMeta {
    pub images: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileImageFillsResponse {
    pub error: bool,
    pub status: u16,
    pub meta: ImageFillsMeta,
}

/// Suffix naming a rendition, e.g. `@2x.png`.
pub fn variant_suffix(scale: f64, format: ExportFormat) -> String {
    format!("@{scale}x.{format}")
}

/// Resolves the export URL of every requested node.
///
/// A missing scale, or one that is zero, negative or not finite, counts as 1.
/// At scale 1 the canonical `{id}.{format}` rendition is assumed to exist and
/// the metadata is not consulted. Any other scale must be listed for the node
/// in `meta`; when it is not, the entry is `None`. Archives produced by older
/// tooling answered such misses with a URL ending in the literal text
/// `undefined`, which never pointed at a real file; an explicit `None` is
/// reported instead.
pub fn resolve_image_urls(
    file_id: &str,
    meta: &ExportMeta,
    params: &FileImageParams,
    base_url: &str,
) -> FileImageResponse {
    let format = params.format.unwrap_or_default();
    let scale = params
        .scale
        .filter(|scale| scale.is_finite() && *scale > 0.0)
        .unwrap_or(1.0);
    let base_url = base_url.trim_end_matches('/');

    let images = params
        .ids
        .iter()
        .map(|id| {
            let url = if scale == 1.0 {
                Some(format!("{base_url}/{file_id}/exports/{id}.{format}"))
            } else {
                let wanted = variant_suffix(scale, format);
                let found = meta
                    .map
                    .get(id)
                    .and_then(|variants| variants.iter().find(|v| **v == wanted));
                if found.is_none() {
                    tracing::debug!(file_id, node_id = %id, variant = %wanted, "no such export rendition");
                }
                found.map(|suffix| format!("{base_url}/{file_id}/exports/{id}{suffix}"))
            };
            (id.clone(), url)
        })
        .collect();

    FileImageResponse { err: None, images }
}

/// Resolves the stored location of every image fill listed in `meta`.
pub fn resolve_fill_urls(file_id: &str, meta: &FillMeta, base_url: &str) -> FileImageFillsResponse {
    let base_url = base_url.trim_end_matches('/');
    let images = meta
        .images
        .iter()
        .map(|(image_ref, stored)| {
            (
                image_ref.clone(),
                format!("{base_url}/{file_id}/images/{stored}"),
            )
        })
        .collect();

    FileImageFillsResponse {
        error: false,
        status: 200,
        meta: ImageFillsMeta { images },
    }
}

#[cfg(test)]
mod unittests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    const BASE: &str = "https://images.example.invalid";

    fn export_meta() -> ExportMeta {
        serde_json::from_value(json!({
            "map": {
                "1:1": ["@2x.png", "@0.5x.jpg"],
                "1:2": ["@2x.svg"]
            }
        }))
        .unwrap()
    }

    #[rstest]
    #[case::png(ExportFormat::Png, "png")]
    #[case::jpg(ExportFormat::Jpg, "jpg")]
    #[case::svg(ExportFormat::Svg, "svg")]
    #[case::pdf(ExportFormat::Pdf, "pdf")]
    fn format_roundtrips_through_str(#[case] format: ExportFormat, #[case] s: &str) {
        assert_eq!(format.to_string(), s);
        assert_eq!(s.parse::<ExportFormat>().unwrap(), format);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "webp".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err, ParseFormatError("webp".into()));
    }

    #[rstest]
    #[case(2.0, ExportFormat::Png, "@2x.png")]
    #[case(0.5, ExportFormat::Jpg, "@0.5x.jpg")]
    #[case(1.5, ExportFormat::Svg, "@1.5x.svg")]
    #[case(4.0, ExportFormat::Pdf, "@4x.pdf")]
    fn suffix_uses_shortest_scale(
        #[case] scale: f64,
        #[case] format: ExportFormat,
        #[case] expected: &str,
    ) {
        assert_eq!(variant_suffix(scale, format), expected);
    }

    #[test]
    fn defaults_to_png_at_scale_one() {
        let res = resolve_image_urls("F", &ExportMeta::default(), &FileImageParams::new(["9:9"]), BASE);
        assert_eq!(res.err, None);
        assert_eq!(
            res.images["9:9"].as_deref(),
            Some("https://images.example.invalid/F/exports/9:9.png")
        );
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-2.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn unusable_scale_falls_back_to_canonical(#[case] scale: f64) {
        let params = FileImageParams::new(["1:2"]).scale(scale);
        let res = resolve_image_urls("F", &export_meta(), &params, BASE);
        assert_eq!(
            res.images["1:2"].as_deref(),
            Some("https://images.example.invalid/F/exports/1:2.png")
        );
    }

    #[test]
    fn scale_two_resolves_listed_variant() {
        let params = FileImageParams::new(["1:1"])
            .scale(2.0)
            .format(ExportFormat::Png);
        let res = resolve_image_urls("F", &export_meta(), &params, BASE);
        assert_eq!(
            res.images,
            BTreeMap::from([(
                "1:1".to_string(),
                Some("https://images.example.invalid/F/exports/1:1@2x.png".to_string())
            )])
        );
    }

    #[test]
    fn fractional_scale_resolves_listed_variant() {
        let params = FileImageParams::new(["1:1"])
            .scale(0.5)
            .format(ExportFormat::Jpg);
        let res = resolve_image_urls("F", &export_meta(), &params, BASE);
        assert_eq!(
            res.images["1:1"].as_deref(),
            Some("https://images.example.invalid/F/exports/1:1@0.5x.jpg")
        );
    }

    // Older tooling produced ".../exports/1:2undefined" here.
    #[rstest]
    #[case::format_mismatch("1:2", 2.0, ExportFormat::Png)]
    #[case::scale_mismatch("1:1", 3.0, ExportFormat::Png)]
    #[case::id_not_in_meta("5:5", 2.0, ExportFormat::Png)]
    fn variant_miss_is_explicit_none(
        #[case] id: &str,
        #[case] scale: f64,
        #[case] format: ExportFormat,
    ) {
        let params = FileImageParams::new([id]).scale(scale).format(format);
        let res = resolve_image_urls("F", &export_meta(), &params, BASE);
        assert_eq!(res.images.len(), 1);
        assert_eq!(res.images[id], None);
    }

    #[test]
    fn mixed_request_keeps_every_id() {
        let params = FileImageParams::new(["1:1", "1:2", "5:5"]).scale(2.0);
        let res = resolve_image_urls("F", &export_meta(), &params, BASE);
        assert_eq!(res.images.len(), 3);
        assert!(res.images["1:1"].is_some());
        assert!(res.images["1:2"].is_none());
        assert!(res.images["5:5"].is_none());
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let res = resolve_image_urls(
            "F",
            &ExportMeta::default(),
            &FileImageParams::new(["1:1"]),
            "/srv/archive/",
        );
        assert_eq!(res.images["1:1"].as_deref(), Some("/srv/archive/F/exports/1:1.png"));
    }

    #[rstest]
    #[case::flat(json!({ "images": { "abc": "abc.png", "def": "def.jpg" } }))]
    #[case::nested(json!({ "meta": { "images": { "abc": "abc.png", "def": "def.jpg" } } }))]
    fn fill_meta_accepts_both_layouts(#[case] raw: serde_json::Value) {
        let meta: FillMeta = serde_json::from_value(raw).unwrap();
        let res = resolve_fill_urls("F", &meta, BASE);
        assert!(!res.error);
        assert_eq!(res.status, 200);
        assert_eq!(
            res.meta.images,
            BTreeMap::from([
                ("abc".to_string(), format!("{BASE}/F/images/abc.png")),
                ("def".to_string(), format!("{BASE}/F/images/def.jpg")),
            ])
        );
    }

    #[test]
    fn empty_fill_meta_yields_empty_images() {
        let res = resolve_fill_urls("F", &FillMeta::default(), BASE);
        assert!(res.meta.images.is_empty());
    }

    #[test]
    fn image_response_serializes_misses_as_null() {
        let params = FileImageParams::new(["5:5"]).scale(2.0);
        let res = resolve_image_urls("F", &export_meta(), &params, BASE);
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value, json!({ "err": null, "images": { "5:5": null } }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_format() -> impl Strategy<Value = ExportFormat> {
        prop_oneof![
            Just(ExportFormat::Jpg),
            Just(ExportFormat::Png),
            Just(ExportFormat::Svg),
            Just(ExportFormat::Pdf),
        ]
    }

    fn arb_export_meta() -> impl Strategy<Value = ExportMeta> {
        prop::collection::btree_map(
            "[0-9]{1,3}:[0-9]{1,3}",
            prop::collection::vec("@[1-4]x\\.(png|jpg|svg|pdf)", 0..4),
            0..8,
        )
        .prop_map(|map| ExportMeta { map })
    }

    proptest! {
        #[test]
        fn scale_one_ignores_meta(
            meta in arb_export_meta(),
            ids in prop::collection::vec("[0-9]{1,3}:[0-9]{1,3}", 0..8),
            format in arb_format(),
        ) {
            let params = FileImageParams::new(ids.clone()).scale(1.0).format(format);
            let res = resolve_image_urls("F", &meta, &params, "base");
            for id in &ids {
                let expected = format!("base/F/exports/{id}.{format}");
                prop_assert_eq!(res.images[id].as_deref(), Some(expected.as_str()));
            }
        }

        #[test]
        fn one_entry_per_distinct_requested_id(
            meta in arb_export_meta(),
            ids in prop::collection::btree_set("[0-9]{1,3}:[0-9]{1,3}", 0..8),
            scale in 1u8..=4,
        ) {
            let params = FileImageParams::new(ids.clone()).scale(f64::from(scale));
            let res = resolve_image_urls("F", &meta, &params, "base");
            prop_assert_eq!(res.images.keys().cloned().collect::<std::collections::BTreeSet<_>>(), ids);
        }

        #[test]
        fn fill_keys_match_meta_keys(
            images in prop::collection::btree_map("[a-f0-9]{8}", "[a-f0-9]{8}\\.png", 0..8),
        ) {
            let meta = FillMeta { images: images.clone() };
            let res = resolve_fill_urls("F", &meta, "base");
            prop_assert_eq!(
                res.meta.images.keys().collect::<Vec<_>>(),
                images.keys().collect::<Vec<_>>()
            );
        }
    }
}
