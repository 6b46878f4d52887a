use crate::mercator::{MapView, WorldPoint};
use crate::models::{CompanyDetail, CompanyRef};
use crate::sequence::{Sequencer, Ticket};

/// Popup box size used for auto-panning, in CSS pixels.
pub const POPUP_WIDTH: f64 = 280.0;
pub const POPUP_HEIGHT: f64 = 220.0;

/// Offsets of the box relative to its anchor: the arrow sits 50px from the
/// box's left edge and 12px below its bottom edge.
pub const POPUP_OFFSET_LEFT: f64 = 50.0;
pub const POPUP_OFFSET_BOTTOM: f64 = 12.0;

/// Minimum distance kept between an opened popup and the viewport edge.
pub const AUTO_PAN_MARGIN: f64 = 20.0;

/// Everything the popup shows for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub cnpj: String,
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub municipio: String,
    pub uf: String,
    pub situacao: String,
}

impl PopupContent {
    pub fn new(company: &CompanyRef, detail: CompanyDetail) -> Self {
        let nome_fantasia = detail.trade_name().map(str::to_string);
        PopupContent {
            cnpj: company.cnpj.clone(),
            razao_social: detail.razao_social,
            nome_fantasia,
            municipio: detail.municipio,
            uf: detail.uf,
            situacao: company.category_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    Closed,
    Open {
        anchor: WorldPoint,
        content: PopupContent,
    },
}

/// A detail lookup the caller must perform for a clicked company.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLookup {
    pub ticket: Ticket,
    pub cnpj: String,
}

#[derive(Debug, Clone)]
struct PendingClick {
    ticket: Ticket,
    company: CompanyRef,
    anchor: WorldPoint,
}

/// Closed/Open popup state machine driven by map clicks and detail lookups.
#[derive(Debug, Clone)]
pub struct PopupController {
    state: PopupState,
    lookups: Sequencer,
    pending: Option<PendingClick>,
}

impl Default for PopupController {
    fn default() -> Self {
        Self::new()
    }
}

impl PopupController {
    pub fn new() -> Self {
        Self {
            state: PopupState::Closed,
            lookups: Sequencer::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PopupState::Open { .. })
    }

    /// Handle a map click. The popup closes immediately; when a company was
    /// hit the returned lookup must be performed and its result passed to
    /// [`resolve`](Self::resolve) or [`fail`](Self::fail).
    pub fn click(&mut self, hit: Option<CompanyRef>, at: WorldPoint) -> Option<DetailLookup> {
        self.state = PopupState::Closed;
        let ticket = self.lookups.issue();
        match hit {
            Some(company) => {
                let lookup = DetailLookup {
                    ticket,
                    cnpj: company.cnpj.clone(),
                };
                self.pending = Some(PendingClick {
                    ticket,
                    company,
                    anchor: at,
                });
                Some(lookup)
            }
            None => {
                self.pending = None;
                None
            }
        }
    }

    /// Open the popup with a looked-up detail. Returns false when the lookup
    /// was superseded by a later click or a close.
    pub fn resolve(&mut self, ticket: Ticket, detail: CompanyDetail) -> bool {
        if !self.lookups.is_current(ticket) {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.state = PopupState::Open {
            anchor: pending.anchor,
            content: PopupContent::new(&pending.company, detail),
        };
        true
    }

    /// Drop a failed lookup; the popup stays closed.
    pub fn fail(&mut self, ticket: Ticket) {
        if self.lookups.is_current(ticket) {
            self.pending = None;
        }
    }

    /// Close button: close and forget any lookup still in flight.
    pub fn close(&mut self) {
        self.state = PopupState::Closed;
        self.pending = None;
        self.lookups.issue();
    }

    /// Screen rectangle `(left, top)` of the popup box, if open.
    pub fn box_origin(&self, view: &MapView) -> Option<(f64, f64)> {
        match &self.state {
            PopupState::Open { anchor, .. } => Some(popup_box_origin(view, *anchor)),
            PopupState::Closed => None,
        }
    }
}

/// Top-left corner of the popup box anchored at `anchor`.
pub fn popup_box_origin(view: &MapView, anchor: WorldPoint) -> (f64, f64) {
    let (ax, ay) = view.world_to_screen(anchor);
    (
        ax - POPUP_OFFSET_LEFT,
        ay - POPUP_OFFSET_BOTTOM - POPUP_HEIGHT,
    )
}

/// Screen delta to pan the map by so a popup anchored at `anchor` fits in
/// the viewport with [`AUTO_PAN_MARGIN`] to spare. `(0, 0)` when it fits.
pub fn auto_pan_delta(view: &MapView, anchor: WorldPoint) -> (f64, f64) {
    let (left, top) = popup_box_origin(view, anchor);
    let right = left + POPUP_WIDTH;
    let bottom = top + POPUP_HEIGHT + POPUP_OFFSET_BOTTOM;

    let dx = if left < AUTO_PAN_MARGIN {
        AUTO_PAN_MARGIN - left
    } else if right > view.width - AUTO_PAN_MARGIN {
        (view.width - AUTO_PAN_MARGIN - right).max(AUTO_PAN_MARGIN - left)
    } else {
        0.0
    };
    let dy = if top < AUTO_PAN_MARGIN {
        AUTO_PAN_MARGIN - top
    } else if bottom > view.height - AUTO_PAN_MARGIN {
        (view.height - AUTO_PAN_MARGIN - bottom).max(AUTO_PAN_MARGIN - top)
    } else {
        0.0
    };
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CompanyRef {
        CompanyRef {
            cnpj: "11222333000144".to_string(),
            tipo: "cliente".to_string(),
        }
    }

    fn detail() -> CompanyDetail {
        CompanyDetail {
            razao_social: "ACME COMERCIO LTDA".to_string(),
            nome_fantasia: Some("Acme".to_string()),
            municipio: "CAMPINAS".to_string(),
            uf: "SP".to_string(),
        }
    }

    fn here() -> WorldPoint {
        WorldPoint::new(0.35, 0.57)
    }

    #[test]
    fn test_click_on_company_requests_lookup_by_cnpj() {
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), here()).unwrap();
        assert_eq!(lookup.cnpj, "11222333000144");
        assert!(!popup.is_open());
    }

    #[test]
    fn test_successful_lookup_opens_with_uppercased_category() {
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), here()).unwrap();
        assert!(popup.resolve(lookup.ticket, detail()));

        match popup.state() {
            PopupState::Open { anchor, content } => {
                assert_eq!(*anchor, here());
                assert_eq!(content.cnpj, "11222333000144");
                assert_eq!(content.razao_social, "ACME COMERCIO LTDA");
                assert_eq!(content.nome_fantasia.as_deref(), Some("Acme"));
                assert_eq!(content.situacao, "CLIENTE");
            }
            PopupState::Closed => panic!("popup should be open"),
        }
    }

    #[test]
    fn test_click_on_empty_area_closes_open_popup() {
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), here()).unwrap();
        popup.resolve(lookup.ticket, detail());
        assert!(popup.is_open());

        assert!(popup.click(None, here()).is_none());
        assert_eq!(popup.state(), &PopupState::Closed);
    }

    #[test]
    fn test_close_button_closes_popup() {
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), here()).unwrap();
        popup.resolve(lookup.ticket, detail());
        popup.close();
        assert!(!popup.is_open());
    }

    #[test]
    fn test_failed_lookup_leaves_popup_closed() {
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), here()).unwrap();
        popup.fail(lookup.ticket);
        assert!(!popup.is_open());
        // A late success for the failed ticket has nothing left to open.
        assert!(!popup.resolve(lookup.ticket, detail()));
    }

    #[test]
    fn test_click_on_second_feature_replaces_content() {
        let mut popup = PopupController::new();
        let first = popup.click(Some(client()), here()).unwrap();
        popup.resolve(first.ticket, detail());

        let other = CompanyRef {
            cnpj: "99888777000166".to_string(),
            tipo: "mercado".to_string(),
        };
        let second = popup.click(Some(other), WorldPoint::new(0.36, 0.58)).unwrap();
        assert!(!popup.is_open());
        assert!(popup.resolve(
            second.ticket,
            CompanyDetail {
                razao_social: "OUTRA SA".to_string(),
                nome_fantasia: None,
                municipio: "SANTOS".to_string(),
                uf: "SP".to_string(),
            }
        ));
        match popup.state() {
            PopupState::Open { content, .. } => {
                assert_eq!(content.cnpj, "99888777000166");
                assert_eq!(content.situacao, "MERCADO");
                assert!(content.nome_fantasia.is_none());
            }
            PopupState::Closed => panic!("popup should be open"),
        }
    }

    #[test]
    fn test_slow_lookup_for_earlier_click_is_discarded() {
        let mut popup = PopupController::new();
        let first = popup.click(Some(client()), here()).unwrap();
        let second = popup.click(None, here());
        assert!(second.is_none());
        assert!(!popup.resolve(first.ticket, detail()));
        assert!(!popup.is_open());
    }

    #[test]
    fn test_close_discards_lookup_in_flight() {
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), here()).unwrap();
        popup.close();
        assert!(!popup.resolve(lookup.ticket, detail()));
        assert!(!popup.is_open());
    }

    #[test]
    fn test_box_origin_sits_above_anchor() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 4, 800.0, 600.0);
        let mut popup = PopupController::new();
        let lookup = popup.click(Some(client()), view.center).unwrap();
        popup.resolve(lookup.ticket, detail());
        let (left, top) = popup.box_origin(&view).unwrap();
        assert!((left - (400.0 - POPUP_OFFSET_LEFT)).abs() < 1e-6);
        assert!((top - (300.0 - POPUP_OFFSET_BOTTOM - POPUP_HEIGHT)).abs() < 1e-6);
    }

    #[test]
    fn test_no_auto_pan_when_popup_fits() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 4, 800.0, 600.0);
        assert_eq!(auto_pan_delta(&view, view.center), (0.0, 0.0));
    }

    #[test]
    fn test_auto_pan_near_top_left_corner() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 4, 800.0, 600.0);
        let anchor = view.screen_to_world(30.0, 40.0);
        let (dx, dy) = auto_pan_delta(&view, anchor);
        // box left = -20, top = 40 - 12 - 220 = -192
        assert!((dx - 40.0).abs() < 1e-6);
        assert!((dy - 212.0).abs() < 1e-6);
    }

    #[test]
    fn test_auto_pan_near_right_edge() {
        let view = MapView::new(WorldPoint::new(0.5, 0.5), 4, 800.0, 600.0);
        let anchor = view.screen_to_world(760.0, 400.0);
        let (dx, dy) = auto_pan_delta(&view, anchor);
        // box right = 760 - 50 + 280 = 990, must end at 780
        assert!((dx + 210.0).abs() < 1e-6);
        assert_eq!(dy, 0.0);
    }
}
