//! Void Editor (headless)
//!
//! Loads a scene document, or builds a small demo scene, prints its
//! hierarchy and runs one play/stop cycle against headless collaborators.
//!
//! ```text
//! void_editor [scene.json] [--save <path>] [--pretty]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use void_editor::{EditorPreferences, EditorSession, Result, SceneLoad};
use void_scene::builtin::{CAMERA_3D, LIGHT_3D, MESH_INSTANCE_3D, NODE_3D};
use void_scene::{NodeId, PropertyValue, ReflectionContext, SceneTree, Vec3};

struct Args {
    scene: Option<PathBuf>,
    save: Option<PathBuf>,
    pretty: bool,
}

impl Args {
    fn parse() -> std::result::Result<Self, String> {
        let mut args = Args {
            scene: None,
            save: None,
            pretty: false,
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--save" => {
                    let path = iter.next().ok_or("--save needs a path")?;
                    args.save = Some(PathBuf::from(path));
                }
                "--pretty" => args.pretty = true,
                other if other.starts_with("--") => return Err(format!("unknown option {}", other)),
                other => args.scene = Some(PathBuf::from(other)),
            }
        }
        Ok(args)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("usage: void_editor [scene.json] [--save <path>] [--pretty]");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut preferences = EditorPreferences::load_or_default();
    if args.pretty {
        preferences.pretty_documents = true;
    }

    let context = Arc::new(ReflectionContext::with_builtins());
    let mut session = EditorSession::new(context, preferences)?;
    log::info!("{} {}", void_editor::NAME, void_editor::VERSION);

    match &args.scene {
        Some(path) => {
            let SceneLoad { report, activations } = pollster::block_on(session.open(path))?;
            log::info!(
                "Opened {} ({} skipped, {} substituted, {} property errors)",
                path.display(),
                report.skipped.len(),
                report.substituted.len(),
                report.property_errors.len()
            );
            log::debug!("{} activations run", activations.len());
        }
        None => build_demo(&mut session)?,
    }

    print_hierarchy(&session.scene().read());

    let before = session.document()?.root;
    pollster::block_on(async {
        session.play().await?;
        if let Some(runtime) = session.controller().runtime_scene() {
            let mut tree = runtime.write();
            log::info!("Running {} nodes", tree.len());
            let root = tree.root_id().clone();
            tree.node_mut(&root)?.set_name("Runtime edit");
        }
        session.stop().await
    })?;
    if session.document()?.root == before {
        log::info!("Back in {} mode; authored scene unchanged", session.mode());
    } else {
        log::error!("Authored scene changed during play");
    }

    if let Some(path) = &args.save {
        session.save(path)?;
        log::info!("Saved {}", path.display());
    }

    if let Some(path) = EditorPreferences::default_path() {
        if let Err(e) = session.preferences().save(&path) {
            log::warn!("Could not save preferences: {}", e);
        }
    }
    Ok(())
}

fn build_demo(session: &mut EditorSession) -> Result<()> {
    session.new_scene("Demo")?;
    let root = session.root_id();

    session.transaction("Build demo", |s| {
        let camera = s.create_node(&root, CAMERA_3D, "Camera")?;
        s.set_property(&camera, "position", Vec3::new(0.0, 2.0, 8.0).into())?;
        s.set_property(&camera, "current", PropertyValue::Boolean(true))?;

        s.create_node(&root, LIGHT_3D, "Sun")?;

        let props = s.create_node(&root, NODE_3D, "Props")?;
        let crate_mesh = s.create_node(&props, MESH_INSTANCE_3D, "Crate")?;
        s.set_property(&crate_mesh, "mesh", PropertyValue::from("meshes/crate.glb"))?;
        s.duplicate_node(&crate_mesh)?;
        Ok(())
    })
}

fn print_hierarchy(tree: &SceneTree) {
    fn visit(tree: &SceneTree, id: &NodeId, depth: usize) {
        if let Some(node) = tree.get(id) {
            log::info!("{}{} [{}]", "  ".repeat(depth), node.name(), node.type_tag());
            for child in node.children() {
                visit(tree, child, depth + 1);
            }
        }
    }
    visit(tree, tree.root_id(), 0);
}
