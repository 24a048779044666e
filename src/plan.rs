use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::prelude::*;

/// Script payload for the script-execution endpoint: navigate to the page,
/// optionally wait, then return a full-page image sized by the request args.
/// Opaque to the harness; its semantics belong to the service.
const RENDER_SCRIPT: &str = r#"
function main(page)
  assert(page:go(page.args.url))
  if page.args.wait then
    assert(page:wait(page.args.wait))
  end
  page:set_result_content_type("image/png")
  return page:png{width=page.args.width,
                  height=page.args.height,
                  render_all=page.args.render_all}
end
"#;

/// The three ways of invoking the rendering service. Order matters: it is
/// part of the seeded draw sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestVariant {
    RenderPng,
    RenderJson,
    Execute,
}

const VARIANTS: &[RequestVariant] = &[
    RequestVariant::RenderPng,
    RequestVariant::RenderJson,
    RequestVariant::Execute,
];

/// Immutable descriptor of one benchmark call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// 1-based position in the planned sequence.
    pub seq: usize,
    /// Total planned requests, carried for progress logging.
    pub total: usize,
    pub endpoint_url: String,
    /// Corpus page this request renders; always present as the `url` param.
    pub page_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Rendered query string; unset values are omitted from the wire.
    pub params: Vec<(String, String)>,
}

impl RequestVariant {
    pub fn endpoint(&self) -> &'static str {
        match self {
            RequestVariant::RenderPng => "render.png",
            RequestVariant::RenderJson => "render.json",
            RequestVariant::Execute => "execute",
        }
    }

    fn params(
        &self,
        page_url: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            ("url".to_string(), page_url.to_string()),
            ("render_all".to_string(), "1".to_string()),
            ("wait".to_string(), "0.1".to_string()),
        ];
        if let Some(width) = width {
            params.push(("width".to_string(), width.to_string()));
        }
        if let Some(height) = height {
            params.push(("height".to_string(), height.to_string()));
        }
        match self {
            RequestVariant::RenderPng => {}
            RequestVariant::RenderJson => {
                params.push(("png".to_string(), "1".to_string()));
            }
            RequestVariant::Execute => {
                params.push(("lua_source".to_string(), RENDER_SCRIPT.to_string()));
            }
        }
        params
    }

    pub fn build(
        &self,
        seq: usize,
        total: usize,
        page_url: &str,
        width: Option<u32>,
        height: Option<u32>,
        service_base: &str,
    ) -> RequestSpec {
        RequestSpec {
            seq,
            total,
            endpoint_url: format!("{}/{}", service_base, self.endpoint()),
            page_url: page_url.to_string(),
            width,
            height,
            params: self.params(page_url, width, height),
        }
    }
}

/// Seed-driven lazy producer of exactly `total` request specs, consumable
/// once in order.
pub struct RequestPlan {
    rng: StdRng,
    corpus: Vec<String>,
    sizes: Vec<(Option<u32>, Option<u32>)>,
    pages_base: String,
    service_base: String,
    total: usize,
    issued: usize,
}

impl RequestPlan {
    pub fn new(
        seed: u64,
        total: usize,
        corpus: Vec<String>,
        sizes: Vec<(Option<u32>, Option<u32>)>,
        pages_base: String,
        service_base: String,
    ) -> Result<Self> {
        if total == 0 {
            return Err(Error::ConfigError(
                "request count must be at least 1".to_string(),
            ));
        }
        if corpus.is_empty() {
            return Err(Error::ConfigError("page corpus is empty".to_string()));
        }
        if !sizes.contains(&(None, None)) {
            return Err(Error::ConfigError(
                "size candidates must include the natural-size pair".to_string(),
            ));
        }
        info!("Using pRNG seed: {}", seed);
        Ok(RequestPlan {
            rng: StdRng::seed_from_u64(seed),
            corpus,
            sizes,
            pages_base,
            service_base,
            total,
            issued: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.total - self.issued
    }
}

impl Iterator for RequestPlan {
    type Item = RequestSpec;

    fn next(&mut self) -> Option<RequestSpec> {
        if self.issued == self.total {
            return None;
        }
        self.issued += 1;

        // Draw order is load-bearing: page, then viewport pair, then variant.
        // The same seed must reproduce the same sequence run after run.
        let page = self.corpus.choose(&mut self.rng)?;
        let &(width, height) = self.sizes.choose(&mut self.rng)?;
        let &variant = VARIANTS.choose(&mut self.rng)?;

        let page_url = format!("{}/{}", self.pages_base, page);
        debug!(
            "Planned request {}/{}: {:?} {} {:?}x{:?}",
            self.issued, self.total, variant, page_url, width, height
        );
        Some(variant.build(
            self.issued,
            self.total,
            &page_url,
            width,
            height,
            &self.service_base,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}
