//! Semantic view over the decoded `AndroidManifest.xml`.

use apkshell_axml::{Axml, Element};

const ACTION_MAIN: &str = "android.intent.action.MAIN";

/// An activity, service or receiver together with its intent-filter actions.
#[derive(Debug)]
pub struct Component {
    /// Fully qualified class name, relative names resolved against the package
    pub name: String,

    /// Action names of the component's intent filters
    pub intents: Vec<String>,
}

impl Component {
    /// Whether the component answers the given intent action
    pub fn has_intent(&self, action: &str) -> bool {
        self.intents.iter().any(|intent| intent == action)
    }
}

/// Extracted manifest facts: package identity, declared components,
/// requested permissions and the debuggable bit.
#[derive(Debug, Default)]
pub struct Manifest {
    pub package: Option<String>,
    pub application_class: Option<String>,
    pub debuggable: bool,
    pub permissions: Vec<String>,
    pub activities: Vec<Component>,
    pub services: Vec<Component>,
    pub receivers: Vec<Component>,

    /// The decoded document, rendered back to text
    pub xml: String,
}

impl Manifest {
    pub fn from_document(document: &Axml) -> Manifest {
        let root = &document.root;
        let package = root.attr("package").map(str::to_owned);

        let mut manifest = Manifest {
            xml: document.to_xml(),
            package,
            ..Manifest::default()
        };

        for child in root.children() {
            if child.name() == "uses-permission"
                && let Some(permission) = child.attr("android:name")
            {
                manifest.permissions.push(permission.to_owned());
            }
        }

        let Some(application) = root.children().find(|el| el.name() == "application") else {
            return manifest;
        };

        manifest.debuggable = application.attr("android:debuggable") == Some("true");
        manifest.application_class = application
            .attr("android:name")
            .map(|name| manifest.qualify(name));

        for child in application.children() {
            match child.name() {
                "activity" | "activity-alias" => {
                    if let Some(component) = manifest.component_of(child) {
                        manifest.activities.push(component);
                    }
                }
                "service" => {
                    if let Some(component) = manifest.component_of(child) {
                        manifest.services.push(component);
                    }
                }
                "receiver" => {
                    if let Some(component) = manifest.component_of(child) {
                        manifest.receivers.push(component);
                    }
                }
                _ => {}
            }
        }

        manifest
    }

    /// Resolve a component name declared relative to the package
    fn qualify(&self, name: &str) -> String {
        match (&self.package, name.starts_with('.')) {
            (Some(package), true) => format!("{package}{name}"),
            _ => name.to_owned(),
        }
    }

    fn component_of(&self, element: &Element) -> Option<Component> {
        // aliases point at their target activity
        let name = element
            .attr("android:targetActivity")
            .or_else(|| element.attr("android:name"))?;

        let intents = element
            .children()
            .filter(|child| child.name() == "intent-filter")
            .flat_map(|filter| filter.children())
            .filter(|child| child.name() == "action")
            .filter_map(|action| action.attr("android:name"))
            .map(str::to_owned)
            .collect();

        Some(Component {
            name: self.qualify(name),
            intents,
        })
    }

    pub fn is_debuggable(&self) -> bool {
        self.debuggable
    }

    /// Activities answering the MAIN action, in declaration order
    pub fn main_activities(&self) -> impl Iterator<Item = &Component> {
        self.activities
            .iter()
            .filter(|component| component.has_intent(ACTION_MAIN))
    }
}
