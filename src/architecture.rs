/// The following diagram shows how a request travels through InkSpire and how a session moves
/// between its phases.
///
/// Only the main types are shown. [`Studio`](crate::Studio) owns the
/// [`SessionChestHandler`](crate::SessionChestHandler) and the [`Loom`](crate::Loom); the loom
/// loads the model once through the [`ModelCache`](crate::ModelCache).
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// graph TB
///     subgraph Browser
///         page[Story page]
///     end
///     subgraph InkSpire
///         service[service::router]
///         subgraph Studio
///             submit
///             refine
///             acknowledge
///         end
///         chest>SessionChestHandler]
///         memory_chest[MemoryChest]-. default impl .- chest
///         subgraph Loom
///             story_pass[StoryPass]
///             refine_pass[RefinePass]
///         end
///         cache[ModelCache]
///     end
///     llm>Llm]
///     pipeline[PipelineLlm]-. impl .- llm
///     openai[OpenAiLlm]-. impl .- llm
///     page -- form post --> service
///     service --> Studio
///     Studio -- load / save session --> chest
///     submit -- prompt --> story_pass
///     refine -- story --> refine_pass
///     story_pass -- generate --> cache
///     refine_pass -- generate --> cache
///     cache -- loads once --> llm
/// ```
///
/// A session moves through the following phases. Generating is possible from every phase, and a
/// blank prompt leaves the phase unchanged.
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Idle
///     Idle --> Generated: submit prompt
///     Generated --> Generated: submit prompt
///     Generated --> Refined: refine
///     Refined --> Refined: refine
///     Refined --> Acknowledged: refresh view
///     Refined --> Generated: submit prompt
///     Acknowledged --> Refined: refine
///     Acknowledged --> Generated: submit prompt
/// ```
pub struct Diagram;
