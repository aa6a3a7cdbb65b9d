use leptos::prelude::*;

use crate::components::flow_map::FlowMapCanvas;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<div class="flow-map-page">
			<FlowMapCanvas />
			<p class="subtitle">
				"Drag nodes or labels to reposition. Switch datasets with the dropdown."
			</p>
		</div>
	}
}
