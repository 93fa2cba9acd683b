//! In-memory collaborators for the unit tests.

use crate::{
	config::ShellConfig,
	coordinator::{ShellView, UpdateCoordinator},
	history::{HistoryEntry, HistoryProvider},
	intercept::NavigationNode,
	notify::{DisplayedNotification, NotificationSink},
	patch::PatchTarget,
	transport::{FetchRequest, FetchResponse, Transport, TransportError},
};
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::Value;
use std::{
	cell::RefCell,
	collections::VecDeque,
	rc::{Rc, Weak},
};

pub(crate) const ORIGIN: &str = "https://admin.test";

#[derive(Debug, Default)]
struct Node {
	tag: String,
	attributes: Vec<(String, String)>,
	properties: Vec<(String, Value)>,
	inner_html: Option<String>,
	children: Vec<MockElement>,
	parent: Weak<RefCell<Node>>,
	failing_attributes: bool,
}

/// A tiny element tree understanding tag, `.class` and `#id` compounds joined by descendant combinators.
#[derive(Debug, Clone)]
pub(crate) struct MockElement(Rc<RefCell<Node>>);

impl MockElement {
	pub(crate) fn new(tag: &str) -> Self {
		Self(Rc::new(RefCell::new(Node {
			tag: tag.to_owned(),
			..Node::default()
		})))
	}

	pub(crate) fn with_attribute(self, name: &str, value: &str) -> Self {
		self.0.borrow_mut().attributes.push((name.to_owned(), value.to_owned()));
		self
	}

	pub(crate) fn failing_attributes(self) -> Self {
		self.0.borrow_mut().failing_attributes = true;
		self
	}

	pub(crate) fn append(&self, child: MockElement) -> MockElement {
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		self.0.borrow_mut().children.push(child.clone());
		child
	}

	pub(crate) fn attribute(&self, name: &str) -> Option<String> {
		self.0.borrow().attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone())
	}

	pub(crate) fn property(&self, name: &str) -> Option<Value> {
		self.0.borrow().properties.iter().rev().find(|(key, _)| key == name).map(|(_, value)| value.clone())
	}

	pub(crate) fn inner_html(&self) -> Option<String> {
		self.0.borrow().inner_html.clone()
	}

	fn parent(&self) -> Option<MockElement> {
		self.0.borrow().parent.upgrade().map(MockElement)
	}

	fn matches_compound(&self, compound: &str) -> bool {
		let node = self.0.borrow();
		let tag_end = compound.find(|c| c == '.' || c == '#').unwrap_or(compound.len());
		let (tag, mut rest) = compound.split_at(tag_end);
		if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&node.tag) {
			return false;
		}

		while let Some(marker) = rest.chars().next() {
			let body = &rest[1..];
			let end = body.find(|c| c == '.' || c == '#').unwrap_or(body.len());
			let name = &body[..end];
			rest = &body[end..];

			let attribute = |key: &str| node.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
			let matched = match marker {
				'.' => attribute("class").map_or(false, |classes| classes.split_whitespace().any(|class| class == name)),
				'#' => attribute("id") == Some(name),
				_ => false,
			};
			if !matched {
				return false;
			}
		}
		true
	}

	fn matches_complex(&self, complex: &str) -> bool {
		let compounds: Vec<&str> = complex.split_whitespace().collect();
		let (last, ancestors) = match compounds.split_last() {
			Some(split) => split,
			None => return false,
		};
		if !self.matches_compound(last) {
			return false;
		}

		let mut current = self.parent();
		for compound in ancestors.iter().rev() {
			loop {
				let element = match current {
					Some(element) => element,
					None => return false,
				};
				current = element.parent();
				if element.matches_compound(compound) {
					break;
				}
			}
		}
		true
	}

	fn matches_selector(&self, selector: &str) -> bool {
		selector.split(',').any(|complex| self.matches_complex(complex.trim()))
	}

	fn find_descendant(&self, selector: &str) -> Option<MockElement> {
		let children = self.0.borrow().children.clone();
		for child in children {
			if child.matches_selector(selector) {
				return Some(child);
			}
			if let Some(found) = child.find_descendant(selector) {
				return Some(found);
			}
		}
		None
	}
}

impl PatchTarget for MockElement {
	type Error = String;

	fn replace_content(&self, markup: &str) {
		let mut node = self.0.borrow_mut();
		node.children.clear();
		node.inner_html = Some(markup.to_owned());
	}

	fn set_attribute(&self, name: &str, value: &str) -> Result<(), String> {
		let mut node = self.0.borrow_mut();
		if node.failing_attributes {
			return Err(format!("InvalidCharacterError: {}", name));
		}
		match node.attributes.iter().position(|(key, _)| key == name) {
			Some(index) => node.attributes[index].1 = value.to_owned(),
			None => node.attributes.push((name.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn set_property(&self, name: &str, value: &Value) -> Result<(), String> {
		self.0.borrow_mut().properties.push((name.to_owned(), value.clone()));
		Ok(())
	}

	fn query_selector(&self, selector: &str) -> Result<Option<Self>, String> {
		// Attribute selectors aren't supported, so they stand in for invalid ones.
		if selector.trim().is_empty() || selector.contains('[') {
			return Err(format!("SyntaxError: {:?} is not a valid selector", selector));
		}
		Ok(self.find_descendant(selector))
	}
}

impl NavigationNode for MockElement {
	fn closest(&self, selector: &str) -> Option<Self> {
		let mut current = Some(self.clone());
		while let Some(element) = current {
			if element.matches_selector(selector) {
				return Some(element);
			}
			current = element.parent();
		}
		None
	}

	fn matches(&self, selector: &str) -> bool {
		self.matches_selector(selector)
	}

	fn attribute(&self, name: &str) -> Option<String> {
		MockElement::attribute(self, name)
	}

	fn resolved_href(&self) -> String {
		match self.attribute("href") {
			None => String::new(),
			Some(href) if href.is_empty() => String::new(),
			Some(href) if href.starts_with("http") => href,
			Some(href) if href.starts_with('/') => format!("{}{}", ORIGIN, href),
			Some(href) => format!("{}/{}", ORIGIN, href),
		}
	}
}

type Scripted = oneshot::Receiver<Result<FetchResponse<()>, TransportError>>;

#[derive(Default)]
struct TransportLog {
	scripted: VecDeque<Scripted>,
	requests: Vec<FetchRequest>,
}

/// Answers requests in the order responses were scripted.
#[derive(Clone, Default)]
pub(crate) struct MockTransport(Rc<RefCell<TransportLog>>);

impl MockTransport {
	pub(crate) fn respond(&self, status: u16, url: &str, body: &str) {
		self.respond_with_headers(status, url, body, &[]);
	}

	pub(crate) fn respond_with_headers(&self, status: u16, url: &str, body: &str, headers: &[(&str, &str)]) {
		self.script(Ok(Mocks::response(status, url, body, headers)));
	}

	pub(crate) fn fail(&self, error: TransportError) {
		self.script(Err(error));
	}

	/// The next request stays pending until the returned sender is used.
	pub(crate) fn defer(&self) -> oneshot::Sender<Result<FetchResponse<()>, TransportError>> {
		let (sender, receiver) = oneshot::channel();
		self.0.borrow_mut().scripted.push_back(receiver);
		sender
	}

	fn script(&self, result: Result<FetchResponse<()>, TransportError>) {
		let (sender, receiver) = oneshot::channel();
		let _ = sender.send(result);
		self.0.borrow_mut().scripted.push_back(receiver);
	}

	pub(crate) fn requests(&self) -> Vec<FetchRequest> {
		self.0.borrow().requests.clone()
	}
}

#[async_trait(?Send)]
impl Transport for MockTransport {
	type Raw = ();

	async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse<()>, TransportError> {
		let scripted = {
			let mut log = self.0.borrow_mut();
			log.requests.push(request);
			log.scripted.pop_front()
		};
		match scripted {
			Some(receiver) => receiver.await.unwrap_or_else(|_| Err(TransportError::Fetch("Scripted response dropped".to_owned()))),
			None => Err(TransportError::Fetch("No response scripted".to_owned())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HistoryCall {
	Push { entry: HistoryEntry, title: String, url: String },
	Replace { entry: HistoryEntry, title: String, url: String },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockHistory(Rc<RefCell<Vec<HistoryCall>>>);

impl MockHistory {
	pub(crate) fn calls(&self) -> Vec<HistoryCall> {
		self.0.borrow().clone()
	}
}

impl HistoryProvider for MockHistory {
	type Error = ();

	fn push_state(&self, entry: &HistoryEntry, title: &str, url: &str) -> Result<(), ()> {
		self.0.borrow_mut().push(HistoryCall::Push {
			entry: entry.clone(),
			title: title.to_owned(),
			url: url.to_owned(),
		});
		Ok(())
	}

	fn replace_state(&self, entry: &HistoryEntry, title: &str, url: &str) -> Result<(), ()> {
		self.0.borrow_mut().push(HistoryCall::Replace {
			entry: entry.clone(),
			title: title.to_owned(),
			url: url.to_owned(),
		});
		Ok(())
	}
}

#[derive(Debug, Default)]
struct ViewLog {
	updating: Vec<bool>,
	urls: Vec<String>,
	titles: Vec<String>,
	updated: Vec<u16>,
}

#[derive(Debug, Clone)]
pub(crate) struct MockView {
	root: MockElement,
	log: Rc<RefCell<ViewLog>>,
}

impl MockView {
	pub(crate) fn updating(&self) -> Vec<bool> {
		self.log.borrow().updating.clone()
	}

	pub(crate) fn urls(&self) -> Vec<String> {
		self.log.borrow().urls.clone()
	}

	pub(crate) fn titles(&self) -> Vec<String> {
		self.log.borrow().titles.clone()
	}

	/// Statuses of the responses announced as `ez:app:updated`.
	pub(crate) fn updated(&self) -> Vec<u16> {
		self.log.borrow().updated.clone()
	}
}

impl ShellView<()> for MockView {
	type Root = MockElement;

	fn root(&self) -> MockElement {
		self.root.clone()
	}

	fn reflect_updating(&self, updating: bool) {
		self.log.borrow_mut().updating.push(updating);
	}

	fn reflect_url(&self, url: &str) {
		self.log.borrow_mut().urls.push(url.to_owned());
	}

	fn set_document_title(&self, title: &str) {
		self.log.borrow_mut().titles.push(title.to_owned());
	}

	fn app_updated(&self, response: &FetchResponse<()>) {
		self.log.borrow_mut().updated.push(response.status);
	}
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockSink(Rc<RefCell<Vec<DisplayedNotification>>>);

impl MockSink {
	pub(crate) fn rendered(&self) -> Vec<DisplayedNotification> {
		self.0.borrow().clone()
	}
}

impl NotificationSink for MockSink {
	fn render(&self, notification: &DisplayedNotification) {
		self.0.borrow_mut().push(notification.clone());
	}
}

pub(crate) type MockCoordinator = UpdateCoordinator<MockTransport, MockHistory, MockView, MockSink>;

/// Shared handles to every mock collaborator, around a shell root containing a `<main>`.
pub(crate) struct Mocks {
	pub(crate) transport: MockTransport,
	pub(crate) history: MockHistory,
	pub(crate) view: MockView,
	pub(crate) sink: MockSink,
	pub(crate) root: MockElement,
	pub(crate) main: MockElement,
}

impl Mocks {
	pub(crate) fn new() -> Self {
		let root = MockElement::new("ez-platform-ui-app");
		let main = root.append(MockElement::new("main"));
		Self {
			transport: MockTransport::default(),
			history: MockHistory::default(),
			view: MockView {
				root: root.clone(),
				log: Rc::default(),
			},
			sink: MockSink::default(),
			root,
			main,
		}
	}

	pub(crate) fn coordinator(&self, config: &ShellConfig) -> MockCoordinator {
		UpdateCoordinator::new(config, self.transport.clone(), self.history.clone(), self.view.clone(), self.sink.clone())
	}

	pub(crate) fn response(status: u16, url: &str, body: &str, headers: &[(&str, &str)]) -> FetchResponse<()> {
		FetchResponse {
			url: url.to_owned(),
			status,
			headers: headers.iter().map(|(name, value)| ((*name).to_owned(), (*value).to_owned())).collect(),
			text: body.to_owned(),
			raw: (),
		}
	}
}
