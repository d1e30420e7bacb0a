// How close to the bottom of the document, in
// pixels, the next page gets requested.
const SCROLL_THRESHOLD: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
  pub scroll_top: f64,
  pub viewport_height: f64,
  pub document_height: f64
}

impl ScrollMetrics {
  pub fn near_bottom(&self) -> bool {
    self.scroll_top + self.viewport_height + SCROLL_THRESHOLD >= self.document_height
  }
}

// How a page request ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageOutcome {
  Loaded,
  Empty,
  Failed,
  // The backend had no search key for us. Only
  // releases the latch, scrolling may try again.
  MissingKey
}

/**
 * Infinite scroll state. Requests are throttled
 * by the in-flight latch and capped by max_pages,
 * the footer has to become visible at some point.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Pager {
  current_page: u32,
  is_fetching: bool,
  has_more: bool,
  max_pages: u32,
  listening: bool
}

impl Pager {

  pub fn new(max_pages: u32) -> Self {
    Self {
      current_page: 0,
      is_fetching: false,
      has_more: true,
      max_pages,
      listening: true
    }
  }

  pub fn current_page(&self) -> u32 {
    self.current_page
  }

  pub fn is_fetching(&self) -> bool {
    self.is_fetching
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn is_listening(&self) -> bool {
    self.listening
  }

  // Returns false when the request must not be
  // sent, sets the in-flight latch otherwise.
  pub fn begin(&mut self, page: u32) -> bool {
    if page >= self.max_pages {
      self.has_more = false;
      return false;
    }
    if self.is_fetching || !self.has_more {
      return false;
    }
    self.is_fetching = true;
    true
  }

  pub fn finish(&mut self, page: u32, outcome: PageOutcome) {
    self.is_fetching = false;
    match outcome {
      PageOutcome::Loaded => self.current_page = page,
      PageOutcome::Empty | PageOutcome::Failed => self.has_more = false,
      PageOutcome::MissingKey => ()
    }
  }

  // Scroll handler, gives the page to request if
  // any. Detaches itself once the last page we're
  // allowed to show is there.
  pub fn next_page_on_scroll(&mut self, metrics: &ScrollMetrics) -> Option<u32> {
    if !self.listening {
      return None;
    }
    if self.current_page + 1 >= self.max_pages {
      self.listening = false;
      return None;
    }
    if metrics.near_bottom() && !self.is_fetching && self.has_more {
      Some(self.current_page + 1)
    } else {
      None
    }
  }

  pub fn reset(&mut self) {
    *self = Self::new(self.max_pages);
  }

}
