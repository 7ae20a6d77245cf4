//! Navigation walkthrough against a console host shell.
//!
//! Run with `RUST_LOG=debug cargo run --example nav_demo` to also see the
//! router's own logging.

use std::cell::RefCell;
use std::rc::Rc;

use webview_navigator::{
    AnimateOptions, AppOptions, Bootstrap, CapabilitySet, Continuation, ViewNode, Webview,
    WebviewFactory,
};

/// Console-backed stand-in for the host's widget tree.
struct ConsoleNode {
    label: String,
    classes: RefCell<Vec<String>>,
    children: RefCell<Vec<Rc<ConsoleNode>>>,
}

impl ConsoleNode {
    fn new(label: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            label: label.into(),
            classes: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
        })
    }
}

impl ViewNode for ConsoleNode {
    fn append_container(&self) -> Rc<dyn ViewNode> {
        let label = format!("{}/container-{}", self.label, self.children.borrow().len());
        let child = ConsoleNode::new(label);
        self.children.borrow_mut().push(child.clone());
        child
    }

    fn add_class(&self, name: &str) {
        let mut classes = self.classes.borrow_mut();
        if !classes.iter().any(|c| c == name) {
            println!("  [dom] {} += .{}", self.label, name);
            classes.push(name.to_string());
        }
    }

    fn remove_class(&self, name: &str) {
        let mut classes = self.classes.borrow_mut();
        if classes.iter().any(|c| c == name) {
            println!("  [dom] {} -= .{}", self.label, name);
            classes.retain(|c| c != name);
        }
    }

    fn has_class(&self, name: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == name)
    }
}

struct Page {
    title: &'static str,
    node: Rc<dyn ViewNode>,
}

impl Webview for Page {
    fn node(&self) -> Rc<dyn ViewNode> {
        self.node.clone()
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::ALL
    }

    fn activate(&self) {
        println!("  [view] {} active", self.title);
    }

    fn deactivate(&self) {
        println!("  [view] {} inactive", self.title);
    }

    fn refresh(&self) {
        println!("  [view] {} refreshed", self.title);
    }

    fn publish(&self, ready: Continuation) {
        println!("  [view] {} mounted", self.title);
        ready();
    }
}

fn page(title: &'static str) -> WebviewFactory {
    Rc::new(move |node| Rc::new(Page { title, node }) as Rc<dyn Webview>)
}

fn main() {
    env_logger::init();

    let mount = ConsoleNode::new("root");
    let options = AppOptions {
        animate: AnimateOptions::Named("slide".to_string()),
        ..AppOptions::default()
    };

    let app = Bootstrap::new(mount, options, |router| {
        router.use_fn("/", |next| {
            println!("  [mw] dispatching {:?}", next.context().server);
            next.proceed();
            Ok(())
        });
        router.define("/", page("home"));
        router.define("/list", page("list"));
        router.define("/list/:id", page("detail"));
    });

    println!("-- start /");
    app.start("/");

    println!("-- forward /list");
    app.forward("/list");

    println!("-- forward /list/7");
    app.forward("/list/7");

    println!("-- back");
    app.back(None);

    println!("-- refresh");
    app.refresh();

    println!("-- done at {}", app.current_path());
}
